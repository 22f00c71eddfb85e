use thiserror::Error;

/// Longest text sent to XTTS in one request.
pub const MAX_SPEECH_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechTextError {
    #[error("text is empty")]
    Empty,
    #[error("text exceeds {max} characters")]
    TooLong { max: usize },
}

/// Trims text headed for speech synthesis and enforces `MAX_SPEECH_CHARS`.
pub fn speech_text(text: &str) -> Result<&str, SpeechTextError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SpeechTextError::Empty);
    }
    if text.chars().count() > MAX_SPEECH_CHARS {
        return Err(SpeechTextError::TooLong {
            max: MAX_SPEECH_CHARS,
        });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_caps_speech_text() {
        assert_eq!(speech_text("  Note saved.\n"), Ok("Note saved."));
        assert_eq!(speech_text(" \t"), Err(SpeechTextError::Empty));

        let at_cap = "é".repeat(MAX_SPEECH_CHARS);
        assert_eq!(speech_text(&at_cap), Ok(at_cap.as_str()));
        assert_eq!(
            speech_text(&format!("{at_cap}x")),
            Err(SpeechTextError::TooLong {
                max: MAX_SPEECH_CHARS
            })
        );
    }
}
