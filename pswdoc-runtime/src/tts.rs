use anyhow::anyhow;
use pswdoc_core::config::XttsConfig as XttsSettings;
use pswdoc_engine::traits::{SpeechRequest, SynthesizedAudio, TtsProvider};
use pswdoc_providers::parse::parse_error_body;
use pswdoc_providers::runtime::HttpExecutor;
use pswdoc_providers::xtts::{XttsConfig, build_tts_request};

#[derive(Debug, Clone)]
pub struct XttsTtsProvider {
    cfg: XttsConfig,
    http: HttpExecutor,
}

impl XttsTtsProvider {
    pub fn new(cfg: &XttsSettings, http: HttpExecutor) -> Self {
        Self {
            cfg: XttsConfig {
                base_url: cfg.base_url.clone(),
                speaker: cfg.speaker.clone(),
                language: cfg.language.clone(),
            },
            http,
        }
    }
}

#[async_trait::async_trait]
impl TtsProvider for XttsTtsProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> anyhow::Result<SynthesizedAudio> {
        let req = build_tts_request(
            &self.cfg,
            request.text.trim(),
            request.speaker.as_deref(),
            request.language.as_deref(),
        );

        let resp = self.http.execute(&req).await?;
        if !resp.is_success() {
            return Err(anyhow!(
                "XTTS synthesis failed: status={} error={}",
                resp.status,
                parse_error_body(&resp.body)
            ));
        }
        if resp.body.is_empty() {
            return Err(anyhow!("XTTS returned no audio"));
        }

        Ok(SynthesizedAudio {
            content_type: resp.content_type.unwrap_or_else(|| "audio/wav".into()),
            bytes: resp.body,
        })
    }
}
