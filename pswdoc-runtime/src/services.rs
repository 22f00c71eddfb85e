use std::path::PathBuf;
use std::sync::Arc;

use pswdoc_core::config::AppConfig;
use pswdoc_engine::report::ReportGenerator;
use pswdoc_engine::traits::{LlmProvider, SttProvider, TtsProvider};
use pswdoc_providers::runtime::HttpExecutor;

use crate::history::ReportHistory;
use crate::llm::OllamaLlmProvider;
use crate::stt::WhisperSttProvider;
use crate::tts::XttsTtsProvider;

/// Everything the HTTP layer and CLI need, built from one config.
#[derive(Clone)]
pub struct Services {
    pub config: AppConfig,
    pub ollama: Arc<OllamaLlmProvider>,
    pub generator: Arc<ReportGenerator>,
    pub stt: Arc<dyn SttProvider>,
    pub tts: Arc<dyn TtsProvider>,
    pub history: Option<ReportHistory>,
}

impl Services {
    pub fn from_config(config: AppConfig, history_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let http = HttpExecutor::new(&config.http)?;

        let ollama = Arc::new(OllamaLlmProvider::new(&config.ollama, http.clone()));
        let llm: Arc<dyn LlmProvider> = ollama.clone();
        let stt: Arc<dyn SttProvider> = Arc::new(WhisperSttProvider::new(&config.whisper, http.clone()));
        let tts: Arc<dyn TtsProvider> = Arc::new(XttsTtsProvider::new(&config.xtts, http));

        let history = history_path
            .filter(|_| config.history.enabled)
            .map(|p| ReportHistory::new(p, config.history.max_entries));

        Ok(Self {
            generator: Arc::new(ReportGenerator::new(llm)),
            ollama,
            stt,
            tts,
            history,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_follows_config_switch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let services = Services::from_config(AppConfig::default(), Some(path.clone())).unwrap();
        assert!(services.history.is_some());

        let mut cfg = AppConfig::default();
        cfg.history.enabled = false;
        let services = Services::from_config(cfg, Some(path)).unwrap();
        assert!(services.history.is_none());
    }
}
