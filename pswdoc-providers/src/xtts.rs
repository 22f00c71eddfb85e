use crate::join_url;
use crate::request::HttpRequest;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XttsConfig {
    pub base_url: String,
    pub speaker: String,
    pub language: String,
}

/// `POST /tts_to_audio/` on an XTTS API server; the response body is WAV audio.
pub fn build_tts_request(
    cfg: &XttsConfig,
    text: &str,
    speaker: Option<&str>,
    language: Option<&str>,
) -> HttpRequest {
    let pick = |v: Option<&str>, default: &str| {
        v.map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    };

    let payload = json!({
        "text": text,
        "speaker_wav": pick(speaker, &cfg.speaker),
        "language": pick(language, &cfg.language),
    });

    let mut req = HttpRequest::post_json(join_url(&cfg.base_url, "/tts_to_audio/"), &payload);
    req.headers.push(("Accept".into(), "audio/wav".into()));
    req
}
