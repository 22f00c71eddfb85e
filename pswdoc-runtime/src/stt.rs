use anyhow::anyhow;
use pswdoc_core::config::WhisperConfig;
use pswdoc_engine::traits::{AudioClip, SttProvider, Transcript};
use pswdoc_providers::parse::{parse_error_body, parse_transcription};
use pswdoc_providers::runtime::HttpExecutor;
use pswdoc_providers::whisper::{
    AudioFile, WhisperSttConfig, build_transcription_request, filename_for_mime,
};

#[derive(Debug, Clone)]
pub struct WhisperSttProvider {
    cfg: WhisperConfig,
    http: HttpExecutor,
}

impl WhisperSttProvider {
    pub fn new(cfg: &WhisperConfig, http: HttpExecutor) -> Self {
        Self {
            cfg: cfg.clone(),
            http,
        }
    }
}

#[async_trait::async_trait]
impl SttProvider for WhisperSttProvider {
    async fn transcribe(
        &self,
        audio: &AudioClip,
        language: Option<&str>,
    ) -> anyhow::Result<Transcript> {
        if audio.bytes.is_empty() {
            return Err(anyhow!("audio clip is empty"));
        }

        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.cfg.language.as_str());

        let cfg = WhisperSttConfig {
            base_url: self.cfg.base_url.clone(),
            model: self.cfg.model.clone(),
            language: Some(language.to_string()),
        };
        let req = build_transcription_request(
            &cfg,
            &AudioFile {
                filename: filename_for_mime(&audio.mime_type).into(),
                mime_type: audio.mime_type.clone(),
                bytes: audio.bytes.clone(),
            },
        );

        let resp = self.http.execute(&req).await?;
        if !resp.is_success() {
            return Err(anyhow!(
                "Whisper transcription failed: status={} error={}",
                resp.status,
                parse_error_body(&resp.body)
            ));
        }

        let text = parse_transcription(&resp.body)?;
        Ok(Transcript {
            text,
            model: self.cfg.model.clone(),
        })
    }
}
