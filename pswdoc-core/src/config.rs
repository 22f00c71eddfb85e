use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ollama: OllamaConfig,
    pub whisper: WhisperConfig,
    pub xtts: XttsConfig,
    pub http: HttpConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "llama3.1".into(),
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    pub base_url: String,
    pub model: String,
    /// `auto` lets the server detect the language.
    pub language: String,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".into(),
            model: "whisper-1".into(),
            language: "auto".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XttsConfig {
    pub base_url: String,
    pub speaker: String,
    pub language: String,
}

impl Default for XttsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8020".into(),
            speaker: "female".into(),
            language: "en".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    // Local models on CPU can take a while to produce a full note.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 200,
        }
    }
}

pub const ENV_BIND_ADDR: &str = "PSWDOC_BIND_ADDR";
pub const ENV_OLLAMA_URL: &str = "PSWDOC_OLLAMA_URL";
pub const ENV_OLLAMA_MODEL: &str = "PSWDOC_OLLAMA_MODEL";
pub const ENV_WHISPER_URL: &str = "PSWDOC_WHISPER_URL";
pub const ENV_XTTS_URL: &str = "PSWDOC_XTTS_URL";

impl AppConfig {
    /// Applies `PSWDOC_*` overrides. Blank values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_BIND_ADDR) {
            self.server.bind_addr = v;
        }
        if let Some(v) = get(ENV_OLLAMA_URL) {
            self.ollama.base_url = v;
        }
        if let Some(v) = get(ENV_OLLAMA_MODEL) {
            self.ollama.model = v;
        }
        if let Some(v) = get(ENV_WHISPER_URL) {
            self.whisper.base_url = v;
        }
        if let Some(v) = get(ENV_XTTS_URL) {
            self.xtts.base_url = v;
        }
    }
}
