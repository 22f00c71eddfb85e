use regex::Regex;
use std::sync::OnceLock;

fn tag_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // `regex` has no backreferences, so opening/closing tag names are not paired.
        Regex::new(r"(?s)<[^>]+>.*?</[^>]+>").expect("valid tag block regex")
    })
}

const NON_SPEECH_MARKERS: &str = "music|coughing|coughs|cough|laughs|laughing|laughter|\
inaudible|silence|noise|background noise|applause|sighs|sneezes|crosstalk|blank_audio";

fn noise_brackets_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Whisper marks non-speech as [music], (coughing), *laughs*. Parentheses and
        // asterisks also carry dosages and vitals, so only known markers match there.
        Regex::new(&format!(
            r"(?i)\[[^\]\n]*\]|\(\s*(?:{m})\s*\)|\*\s*(?:{m})\s*\*",
            m = NON_SPEECH_MARKERS
        ))
        .expect("valid bracket regex")
    })
}

fn filler_words_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(uh|um|uhm|umm|ah|eh|hmm|hm|mmm|mm)\b[,.]?").expect("valid filler regex")
    })
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]{2,}").expect("valid whitespace regex"))
}

fn reasoning_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<thinking>.*?</thinking>|<think>.*?</think>|<reasoning>.*?</reasoning>")
            .expect("valid reasoning regex")
    })
}

/// Cleans a dictated shift transcript before it is shown to the model.
pub fn filter_transcription_output(text: &str) -> String {
    let mut out = tag_block_re().replace_all(text, "").to_string();
    out = noise_brackets_re().replace_all(&out, "").to_string();
    out = filler_words_re().replace_all(&out, "").to_string();
    out = whitespace_re().replace_all(&out, " ").to_string();

    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips `<think>`, `<thinking>` and `<reasoning>` blocks emitted by reasoning models.
pub fn filter_reasoning_blocks(text: &str) -> String {
    reasoning_re().replace_all(text, "").trim().to_string()
}

/// Truncates to at most `max` chars, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
