use crate::join_url;
use crate::request::{Body, HttpRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhisperSttConfig {
    pub base_url: String,
    pub model: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// OpenAI-compatible `POST /v1/audio/transcriptions`, as served by local Whisper servers.
pub fn build_transcription_request(cfg: &WhisperSttConfig, audio: &AudioFile) -> HttpRequest {
    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::new();

    append_file(
        &mut body,
        &boundary,
        "file",
        &audio.filename,
        &audio.mime_type,
        &audio.bytes,
    );
    append_field(&mut body, &boundary, "model", &cfg.model);
    append_field(&mut body, &boundary, "response_format", "json");
    append_field(&mut body, &boundary, "temperature", "0.0");

    if let Some(lang) = cfg
        .language
        .as_ref()
        .filter(|s| !s.trim().is_empty() && s.as_str() != "auto")
    {
        append_field(&mut body, &boundary, "language", lang);
    }

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    HttpRequest {
        method: "POST".into(),
        url: join_url(&cfg.base_url, "/v1/audio/transcriptions"),
        headers: vec![
            (
                "Content-Type".into(),
                format!("multipart/form-data; boundary={}", boundary),
            ),
            ("Accept".into(), "application/json".into()),
        ],
        body: Body::MultipartFormData {
            boundary,
            bytes: body,
        },
    }
}

/// Picks a filename extension the Whisper server can sniff the container from.
pub fn filename_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    match essence {
        "audio/wav" | "audio/x-wav" | "audio/wave" => "audio.wav",
        "audio/webm" => "audio.webm",
        "audio/ogg" => "audio.ogg",
        "audio/mpeg" | "audio/mp3" => "audio.mp3",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "audio.m4a",
        "audio/flac" => "audio.flac",
        _ => "audio.bin",
    }
}

fn append_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}
