use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use pswdoc_core::config::AppConfig;
use pswdoc_runtime::services::Services;
use pswdoc_server::build_router;
use pswdoc_server::routes::MAX_BODY_BYTES;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    upstream: MockServer,
    router: Router,
    dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    harness_with(|_| {}).await
}

async fn harness_with(tweak: impl FnOnce(&mut AppConfig)) -> Harness {
    let upstream = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let mut cfg = AppConfig::default();
    cfg.ollama.base_url = upstream.uri();
    cfg.whisper.base_url = upstream.uri();
    cfg.xtts.base_url = upstream.uri();
    tweak(&mut cfg);

    let services = Services::from_config(cfg, Some(dir.path().join("history.json"))).unwrap();
    Harness {
        upstream,
        router: build_router(services),
        dir,
    }
}

async fn send_response(router: &Router, req: Request<Body>) -> (StatusCode, String, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, serde_json::from_slice(&body).unwrap())
}

fn post_raw_json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn ollama_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "llama3.1",
        "response": text,
        "done": true,
        "done_reason": "stop",
    }))
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness().await;
    let (status, body) = send(&h.router, Request::get("/api/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["status"], "ok");
}

#[tokio::test]
async fn generates_report_and_records_history() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ollama_reply(
            r#"Sure, here is the note: {"data":"Client resting in bed.","action":"Repositioned client.","response":"Client said she felt better.","concerns":[]}"#,
        ))
        .mount(&h.upstream)
        .await;

    let (status, body) = send(
        &h.router,
        post_json(
            "/api/generate-ai-report",
            json!({
                "client_name": "Mrs. A",
                "observations": "Resting in bed",
                "tasks": ["Repositioning"]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["document"]["action"], "Repositioned client.");
    assert_eq!(v["source"]["type"], "model");
    assert_eq!(v["source"]["method"], "scanned");

    let (status, body) = send(&h.router, Request::get("/api/reports").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v.as_array().unwrap().len(), 1);
    assert_eq!(v[0]["client_name"], "Mrs. A");
    assert_eq!(v[0]["source"], "model");
}

#[tokio::test]
async fn unusable_model_output_returns_fallback_note() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ollama_reply(r#"{"data":"only data"}"#))
        .mount(&h.upstream)
        .await;

    let (status, body) = send(
        &h.router,
        post_json("/api/generate-ai-report", json!({ "observations": "Client napped." })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["source"]["type"], "fallback");
    assert_eq!(v["source"]["reason"]["kind"], "invalid");
    assert_eq!(v["document"]["data"], "Client napped.");
    assert_eq!(v["raw_output"], r#"{"data":"only data"}"#);
}

#[tokio::test]
async fn empty_report_request_is_bad_request() {
    let h = harness().await;
    let (status, body) = send(
        &h.router,
        post_json("/api/generate-ai-report", json!({ "observations": "  " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert!(v["error"].as_str().unwrap().contains("nothing to document"));
    assert!(h.upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn transcribe_proxies_to_whisper() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"text":"Client ate all of dinner."}"#,
            "application/json",
        ))
        .mount(&h.upstream)
        .await;

    let req = Request::post("/api/transcribe?language=en")
        .header(header::CONTENT_TYPE, "audio/webm")
        .body(Body::from("fake-audio"))
        .unwrap();
    let (status, body) = send(&h.router, req).await;

    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["text"], "Client ate all of dinner.");

    let empty = Request::post("/api/transcribe")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&h.router, empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn whisper_failure_is_bad_gateway() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&h.upstream)
        .await;

    let req = Request::post("/api/transcribe")
        .header(header::CONTENT_TYPE, "audio/wav")
        .body(Body::from("RIFF"))
        .unwrap();
    let (status, body) = send(&h.router, req).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert!(v["error"].as_str().unwrap().starts_with("Whisper is unavailable"));
}

#[tokio::test]
async fn text_to_speech_returns_audio() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/tts_to_audio/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"RIFF-audio".to_vec(), "audio/wav"))
        .mount(&h.upstream)
        .await;

    let resp = h
        .router
        .clone()
        .oneshot(post_json("/api/text-to-speech", json!({ "text": "Note saved." })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "audio/wav"
    );
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"RIFF-audio");

    let (status, _) = send(
        &h.router,
        post_json("/api/text-to-speech", json!({ "text": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn models_lists_installed_ollama_models() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"models":[{"name":"llama3.1:latest"},{"name":"phi3"}]}"#,
            "application/json",
        ))
        .mount(&h.upstream)
        .await;

    let (status, body) = send(&h.router, Request::get("/api/models").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["configured"], "llama3.1");
    assert_eq!(v["installed"], json!(["llama3.1:latest", "phi3"]));
}

#[tokio::test]
async fn malformed_json_gets_json_error_body() {
    let h = harness().await;

    let (status, content_type, v) = send_response(
        &h.router,
        post_raw_json("/api/generate-ai-report", r#"{"observations":"Client"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type, "application/json");
    assert!(v["error"].as_str().unwrap().contains("JSON"));

    let (status, content_type, v) = send_response(
        &h.router,
        post_raw_json("/api/generate-ai-report", r#"{"tasks":"not a list"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type, "application/json");
    assert!(v["error"].is_string());

    let (status, _, v) = send_response(
        &h.router,
        post_raw_json("/api/text-to-speech", "not json"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["error"].is_string());
    assert!(h.upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn text_to_speech_rejects_text_over_cap() {
    let h = harness().await;
    let (status, _, v) = send_response(
        &h.router,
        post_json("/api/text-to-speech", json!({ "text": "a".repeat(2001) })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "text exceeds 2000 characters");
    assert!(h.upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn oversized_body_is_rejected_with_json_error() {
    let h = harness().await;
    let req = Request::post("/api/transcribe")
        .header(header::CONTENT_TYPE, "audio/wav")
        .body(Body::from(vec![0u8; MAX_BODY_BYTES + 1]))
        .unwrap();

    let (status, content_type, v) = send_response(&h.router, req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(content_type, "application/json");
    assert!(v["error"].as_str().unwrap().contains("exceeds"));
}

#[tokio::test]
async fn models_is_bad_gateway_when_ollama_is_down() {
    // Nothing listens on the discard port.
    let h = harness_with(|cfg| cfg.ollama.base_url = "http://127.0.0.1:9".into()).await;

    let (status, _, v) = send_response(
        &h.router,
        Request::get("/api/models").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(v["error"].as_str().unwrap().starts_with("Ollama is unavailable"));
}

#[tokio::test]
async fn note_is_returned_when_history_cannot_be_written() {
    let h = harness().await;
    std::fs::create_dir(h.dir.path().join("history.json")).unwrap();
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ollama_reply(
            r#"{"data":"Client resting.","action":"Checked on client.","response":"Client content."}"#,
        ))
        .mount(&h.upstream)
        .await;

    let (status, _, v) = send_response(
        &h.router,
        post_json("/api/generate-ai-report", json!({ "observations": "Resting" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["source"]["type"], "model");
    assert_eq!(v["document"]["data"], "Client resting.");
}

#[tokio::test]
async fn reports_honours_limit() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ollama_reply("no json at all"))
        .mount(&h.upstream)
        .await;

    for client in ["first", "second", "third"] {
        let (status, _) = send(
            &h.router,
            post_json(
                "/api/generate-ai-report",
                json!({ "client_name": client, "observations": "Calm" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _, v) = send_response(
        &h.router,
        Request::get("/api/reports?limit=2").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let clients: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["client_name"].as_str().unwrap())
        .collect();
    assert_eq!(clients, vec!["third", "second"]);
    assert_eq!(v[0]["source"], "fallback");
}
