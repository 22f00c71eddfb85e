use anyhow::{Context, anyhow};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: Option<String>,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaCompletion {
    pub text: String,
    /// `length` means the model hit its token limit and the text is truncated.
    pub done_reason: Option<String>,
}

pub fn parse_ollama_generate(body: &[u8]) -> anyhow::Result<OllamaCompletion> {
    let resp: OllamaGenerateResponse =
        serde_json::from_slice(body).context("decode Ollama generate JSON")?;
    let text = resp
        .response
        .ok_or_else(|| anyhow!("no response in Ollama generate output"))?;
    Ok(OllamaCompletion {
        text,
        done_reason: resp.done_reason,
    })
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

pub fn parse_ollama_tags(body: &[u8]) -> anyhow::Result<Vec<String>> {
    let resp: OllamaTagsResponse =
        serde_json::from_slice(body).context("decode Ollama tags JSON")?;
    Ok(resp.models.into_iter().map(|m| m.name).collect())
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub fn parse_transcription(body: &[u8]) -> anyhow::Result<String> {
    let resp: TranscriptionResponse =
        serde_json::from_slice(body).context("decode transcription JSON")?;
    Ok(resp.text.trim().to_string())
}

/// Best-effort extraction of an upstream error message for logs and API errors.
pub fn parse_error_body(body: &[u8]) -> String {
    const MAX_LEN: usize = 300;

    let from_json = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let field = v.get("error").or_else(|| v.get("detail"))?;
            match field {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Object(o) => o
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
                other => Some(other.to_string()),
            }
        });

    let msg = from_json.unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
    pswdoc_core::text::truncate_chars(&msg, MAX_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ollama_generate_response() {
        let body = br#"{"model":"llama3.1","response":"{\"data\":\"x\"}","done":true,"done_reason":"stop"}"#;
        let out = parse_ollama_generate(body).unwrap();
        assert_eq!(out.text, r#"{"data":"x"}"#);
        assert_eq!(out.done_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn ollama_missing_response_errors() {
        assert!(parse_ollama_generate(br#"{"done":true}"#).is_err());
        assert!(parse_ollama_generate(b"not json").is_err());
    }

    #[test]
    fn parses_tags() {
        let body = br#"{"models":[{"name":"llama3.1:latest","size":1},{"name":"mistral"}]}"#;
        assert_eq!(
            parse_ollama_tags(body).unwrap(),
            vec!["llama3.1:latest".to_string(), "mistral".to_string()]
        );
    }

    #[test]
    fn parses_transcription_text() {
        assert_eq!(
            parse_transcription(br#"{"text":" Client is resting. "}"#).unwrap(),
            "Client is resting."
        );
    }

    #[test]
    fn extracts_error_messages() {
        assert_eq!(parse_error_body(br#"{"error":"model not found"}"#), "model not found");
        assert_eq!(parse_error_body(br#"{"detail":"bad speaker"}"#), "bad speaker");
        assert_eq!(
            parse_error_body(br#"{"error":{"message":"overloaded"}}"#),
            "overloaded"
        );
        assert_eq!(parse_error_body(b" Internal Server Error "), "Internal Server Error");
    }
}
