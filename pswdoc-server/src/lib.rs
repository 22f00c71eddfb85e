pub mod error;
pub mod routes;

use std::net::SocketAddr;

use anyhow::Context;
use pswdoc_runtime::services::Services;

pub use routes::build_router;

pub async fn serve(services: Services) -> anyhow::Result<()> {
    let addr: SocketAddr = services
        .config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address: {}", services.config.server.bind_addr))?;

    let app = build_router(services);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    log::info!("Starting server at {}", addr);

    axum::serve(listener, app).await.context("server stopped")?;
    Ok(())
}
