use crate::text::filter_reasoning_blocks;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// How the JSON object was recovered from model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// The whole output was a JSON object.
    Direct,
    /// The object sat inside a markdown code fence.
    Fenced,
    /// The object was embedded in surrounding prose.
    Scanned,
    /// The object was truncated and had to be closed.
    Repaired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub value: Map<String, Value>,
    pub method: ExtractionMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("model output is empty")]
    Empty,
    #[error("no JSON object found in model output")]
    NoJsonObject,
    #[error("JSON object could not be parsed: {0}")]
    Unparseable(String),
}

/// Locates and parses the first usable JSON object in free-form LLM output.
///
/// Tried in order: the whole text, the body of a markdown fence, then every `{`
/// in the text by position. A balanced candidate is parsed as-is; a candidate that
/// runs off the end of the text is closed (open string, dangling key, missing
/// brackets, half-written escapes and literals) and parsed.
pub fn extract_json_object(text: &str) -> Result<Extracted, ExtractError> {
    let cleaned = filter_reasoning_blocks(text);
    if cleaned.is_empty() {
        return Err(ExtractError::Empty);
    }

    if let Ok(value) = parse_object(&cleaned) {
        return Ok(Extracted {
            value,
            method: ExtractionMethod::Direct,
        });
    }

    if let Some(body) = fenced_body(&cleaned) {
        if let Ok(value) = parse_object(body.trim()) {
            return Ok(Extracted {
                value,
                method: ExtractionMethod::Fenced,
            });
        }
    }

    scan_candidates(&cleaned)
}

fn scan_candidates(text: &str) -> Result<Extracted, ExtractError> {
    let bytes = text.as_bytes();
    let mut first_error: Option<String> = None;
    let mut saw_candidate = false;

    let starts = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'{')
        .map(|(i, _)| i);

    for start in starts {
        saw_candidate = true;

        let attempt = match walk(bytes, start) {
            Walk::Balanced(end) => {
                parse_object(&text[start..end]).map(|value| (value, ExtractionMethod::Scanned))
            }
            Walk::Unterminated(open) => {
                let repaired = repair(&text[start..], &open);
                parse_object(&repaired).map(|value| (value, ExtractionMethod::Repaired))
            }
            Walk::Mismatched => continue,
        };

        match attempt {
            Ok((value, method)) => return Ok(Extracted { value, method }),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    if !saw_candidate {
        return Err(ExtractError::NoJsonObject);
    }
    Err(ExtractError::Unparseable(
        first_error.unwrap_or_else(|| "unbalanced brackets".into()),
    ))
}

fn parse_object(s: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("top-level value is not an object".into()),
        Err(e) => Err(e.to_string()),
    }
}

fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip the info string (`json`, `JSON`, ...).
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    // A truncated response may never close its fence.
    match body.find("```") {
        Some(close) => Some(&body[..close]),
        None => Some(body),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenState {
    closers: Vec<u8>,
    in_string: bool,
    escaped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Walk {
    /// Byte offset one past the closing brace.
    Balanced(usize),
    Unterminated(OpenState),
    Mismatched,
}

fn walk(bytes: &[u8], start: usize) -> Walk {
    let mut closers: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    // Only ASCII is inspected, and UTF-8 continuation bytes are never ASCII.
    for (pos, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => closers.push(b'}'),
            b'[' => closers.push(b']'),
            b'}' | b']' => {
                if closers.pop() != Some(b) {
                    return Walk::Mismatched;
                }
                if closers.is_empty() {
                    return Walk::Balanced(pos + 1);
                }
            }
            _ => {}
        }
    }

    Walk::Unterminated(OpenState {
        closers,
        in_string,
        escaped,
    })
}

fn repair(fragment: &str, open: &OpenState) -> String {
    let mut out = fragment.to_string();

    if open.in_string {
        if open.escaped {
            out.pop();
        }
        if let Some(escape_start) = partial_unicode_escape_start(&out) {
            out.truncate(escape_start);
        }
        out.push('"');
    }

    let in_object = open.closers.last() == Some(&b'}');
    loop {
        let keep = out.trim_end().len();
        out.truncate(keep);

        if out.ends_with(',') || out.ends_with(':') {
            out.pop();
            continue;
        }

        // `tru`, `nul`, `1.`: a value cut mid-token goes, and its key with it.
        if let Some(token_start) = partial_literal_start(&out) {
            out.truncate(token_start);
            continue;
        }

        // A string directly after `{` or `,` inside an object is a key with no value.
        if in_object && out.ends_with('"') {
            if let Some(key_start) = trailing_string_start(&out) {
                let before = out[..key_start].trim_end();
                if before.ends_with(',') {
                    let cut = before.len() - 1;
                    out.truncate(cut);
                    continue;
                }
                if before.ends_with('{') {
                    out.truncate(before.len());
                    continue;
                }
            }
        }

        break;
    }

    for closer in open.closers.iter().rev() {
        out.push(*closer as char);
    }
    out
}

/// Start of a `\uXXXX` escape cut short at the end of an open string.
fn partial_unicode_escape_start(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let hex = bytes
        .iter()
        .rev()
        .take_while(|b| b.is_ascii_hexdigit())
        .count();
    if hex >= 4 {
        return None;
    }

    let u = bytes.len().checked_sub(hex + 1)?;
    if bytes[u] != b'u' {
        return None;
    }
    let backslashes = bytes[..u].iter().rev().take_while(|b| **b == b'\\').count();
    (backslashes % 2 == 1).then(|| u - 1)
}

/// Start of a bare token at the end that is not a complete JSON literal or number.
fn partial_literal_start(s: &str) -> Option<usize> {
    let len = s
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'+'))
        .count();
    if len == 0 {
        return None;
    }

    let start = s.len() - len;
    match serde_json::from_str::<Value>(&s[start..]) {
        Ok(Value::Bool(_) | Value::Null | Value::Number(_)) => None,
        _ => Some(start),
    }
}

fn trailing_string_start(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 || bytes[bytes.len() - 1] != b'"' {
        return None;
    }

    let mut i = bytes.len() - 1;
    while i > 0 {
        i -= 1;
        if bytes[i] != b'"' {
            continue;
        }
        let backslashes = bytes[..i].iter().rev().take_while(|b| **b == b'\\').count();
        if backslashes % 2 == 0 {
            return Some(i);
        }
    }
    None
}
