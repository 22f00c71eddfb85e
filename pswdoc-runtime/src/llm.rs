use anyhow::anyhow;
use pswdoc_core::config::OllamaConfig;
use pswdoc_engine::traits::{Generated, LlmProvider};
use pswdoc_providers::ollama::{OllamaGenerateConfig, build_generate_request, build_tags_request};
use pswdoc_providers::parse::{parse_error_body, parse_ollama_generate, parse_ollama_tags};
use pswdoc_providers::runtime::HttpExecutor;

#[derive(Debug, Clone)]
pub struct OllamaLlmProvider {
    cfg: OllamaGenerateConfig,
    http: HttpExecutor,
}

impl OllamaLlmProvider {
    pub fn new(cfg: &OllamaConfig, http: HttpExecutor) -> Self {
        Self {
            cfg: OllamaGenerateConfig {
                base_url: cfg.base_url.clone(),
                model: cfg.model.clone(),
                temperature: cfg.temperature,
            },
            http,
        }
    }

    /// Installed model names, also used as a reachability probe.
    pub async fn list_models(&self) -> anyhow::Result<Vec<String>> {
        let req = build_tags_request(&self.cfg.base_url);
        let resp = self.http.execute(&req).await?;
        if !resp.is_success() {
            return Err(anyhow!(
                "Ollama tags request failed: status={} error={}",
                resp.status,
                parse_error_body(&resp.body)
            ));
        }
        parse_ollama_tags(&resp.body)
    }
}

#[async_trait::async_trait]
impl LlmProvider for OllamaLlmProvider {
    async fn generate(
        &self,
        system_message: &str,
        user_message: &str,
    ) -> anyhow::Result<Generated> {
        let req = build_generate_request(&self.cfg, system_message, user_message);
        let resp = self.http.execute(&req).await?;

        if !resp.is_success() {
            return Err(anyhow!(
                "Ollama generate failed: status={} error={}",
                resp.status,
                parse_error_body(&resp.body)
            ));
        }

        let out = parse_ollama_generate(&resp.body)?;
        Ok(Generated {
            truncated: out.done_reason.as_deref() == Some("length"),
            text: out.text,
            model: self.cfg.model.clone(),
        })
    }
}
