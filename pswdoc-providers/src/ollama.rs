use crate::join_url;
use crate::request::HttpRequest;
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
pub struct OllamaGenerateConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

/// `POST /api/generate` in non-streaming JSON mode.
pub fn build_generate_request(
    cfg: &OllamaGenerateConfig,
    system: &str,
    prompt: &str,
) -> HttpRequest {
    let payload = json!({
        "model": cfg.model,
        "system": system,
        "prompt": prompt,
        "stream": false,
        "format": "json",
        "options": { "temperature": cfg.temperature },
    });

    HttpRequest::post_json(join_url(&cfg.base_url, "/api/generate"), &payload)
}

/// `GET /api/tags` lists installed models.
pub fn build_tags_request(base_url: &str) -> HttpRequest {
    HttpRequest::get(join_url(base_url, "/api/tags"))
}
