use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generated {
    pub text: String,
    pub model: String,
    /// True when the model stopped at its token limit.
    pub truncated: bool,
}

/// Encoded audio as uploaded by the browser (webm, wav, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, system_message: &str, user_message: &str)
    -> anyhow::Result<Generated>;
}

#[async_trait]
pub trait SttProvider: Send + Sync {
    async fn transcribe(&self, audio: &AudioClip, language: Option<&str>)
    -> anyhow::Result<Transcript>;
}

#[async_trait]
pub trait TtsProvider: Send + Sync {
    async fn synthesize(&self, request: &SpeechRequest) -> anyhow::Result<SynthesizedAudio>;
}
