use crate::report::ReportRequest;
use crate::text::{filter_transcription_output, truncate_chars};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const MAX_FIELD_CHARS: usize = 4000;
pub const MAX_LIST_ITEMS: usize = 20;

pub const FALLBACK_NO_DATA: &str = "No observations were recorded for this shift.";
pub const FALLBACK_ROUTINE_ACTION: &str = "Routine care provided as scheduled.";
pub const FALLBACK_RESPONSE: &str =
    "Client response was not captured; confirm with the client or supervisor.";
pub const FALLBACK_FOLLOW_UP: &str = "Review and complete this note manually.";

/// A shift note in Data-Action-Response form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DarDocument {
    /// Objective observations.
    pub data: String,
    /// Care actions the PSW took.
    pub action: String,
    /// How the client responded.
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Items to escalate to a supervisor.
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub follow_up: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    Missing,
    WrongType { expected: String },
    Empty,
    TooLong { max: usize },
    TooManyItems { max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub problem: Problem,
}

impl ValidationIssue {
    fn new(field: impl Into<String>, problem: Problem) -> Self {
        Self {
            field: field.into(),
            problem,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            Problem::Missing => write!(f, "{}: missing", self.field),
            Problem::WrongType { expected } => write!(f, "{}: expected {expected}", self.field),
            Problem::Empty => write!(f, "{}: empty", self.field),
            Problem::TooLong { max } => write!(f, "{}: longer than {max} chars", self.field),
            Problem::TooManyItems { max } => write!(f, "{}: more than {max} items", self.field),
        }
    }
}

/// Validates an extracted object against the DAR schema.
///
/// Keys match case-insensitively, and `followUp`/`follow-up` are accepted for
/// `follow_up`. Unknown keys are ignored. Every issue is reported, not just the first.
pub fn validate_dar(map: &Map<String, Value>) -> Result<DarDocument, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let data = required_text(map, "data", &[], &mut issues);
    let action = required_text(map, "action", &[], &mut issues);
    let response = required_text(map, "response", &[], &mut issues);
    let summary = optional_text(map, "summary", &mut issues);
    let concerns = text_list(map, "concerns", &[], &mut issues);
    let follow_up = text_list(map, "follow_up", &["followup", "follow-up"], &mut issues);

    if !issues.is_empty() {
        return Err(issues);
    }

    Ok(DarDocument {
        data: data.unwrap_or_default(),
        action: action.unwrap_or_default(),
        response: response.unwrap_or_default(),
        summary,
        concerns,
        follow_up,
    })
}

fn lookup<'a>(map: &'a Map<String, Value>, key: &str, aliases: &[&str]) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| {
            k.eq_ignore_ascii_case(key) || aliases.iter().any(|a| k.eq_ignore_ascii_case(a))
        })
        .map(|(_, v)| v)
}

fn check_text(field: &str, s: &str, issues: &mut Vec<ValidationIssue>) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        issues.push(ValidationIssue::new(field, Problem::Empty));
        return None;
    }
    if trimmed.chars().count() > MAX_FIELD_CHARS {
        issues.push(ValidationIssue::new(
            field,
            Problem::TooLong {
                max: MAX_FIELD_CHARS,
            },
        ));
        return None;
    }
    Some(trimmed.to_string())
}

fn required_text(
    map: &Map<String, Value>,
    key: &str,
    aliases: &[&str],
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match lookup(map, key, aliases) {
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::new(key, Problem::Missing));
            None
        }
        Some(Value::String(s)) => check_text(key, s, issues),
        Some(_) => {
            issues.push(ValidationIssue::new(
                key,
                Problem::WrongType {
                    expected: "string".into(),
                },
            ));
            None
        }
    }
}

fn optional_text(
    map: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match lookup(map, key, &[]) {
        None | Some(Value::Null) => None,
        // Models often emit "" for "nothing to add".
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => check_text(key, s, issues),
        Some(_) => {
            issues.push(ValidationIssue::new(
                key,
                Problem::WrongType {
                    expected: "string".into(),
                },
            ));
            None
        }
    }
}

fn text_list(
    map: &Map<String, Value>,
    key: &str,
    aliases: &[&str],
    issues: &mut Vec<ValidationIssue>,
) -> Vec<String> {
    let items: Vec<&Value> = match lookup(map, key, aliases) {
        None | Some(Value::Null) => return vec![],
        Some(v @ Value::String(_)) => vec![v],
        Some(Value::Array(values)) => values.iter().collect(),
        Some(_) => {
            issues.push(ValidationIssue::new(
                key,
                Problem::WrongType {
                    expected: "array of strings".into(),
                },
            ));
            return vec![];
        }
    };

    if items.len() > MAX_LIST_ITEMS {
        issues.push(ValidationIssue::new(
            key,
            Problem::TooManyItems {
                max: MAX_LIST_ITEMS,
            },
        ));
        return vec![];
    }

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let field = format!("{key}[{i}]");
        match item {
            Value::String(s) => {
                if let Some(s) = check_text(&field, s, issues) {
                    out.push(s);
                }
            }
            _ => issues.push(ValidationIssue::new(
                field,
                Problem::WrongType {
                    expected: "string".into(),
                },
            )),
        }
    }
    out
}

/// Builds a DAR note straight from the PSW's input, without a model.
///
/// Deterministic: the same request always yields the same document.
pub fn synthesize_fallback(request: &ReportRequest) -> DarDocument {
    let observations = request.observations.trim();
    let transcript = request
        .transcript
        .as_deref()
        .map(filter_transcription_output)
        .unwrap_or_default();

    let data = if !observations.is_empty() {
        observations.to_string()
    } else if !transcript.is_empty() {
        transcript
    } else {
        FALLBACK_NO_DATA.to_string()
    };

    let tasks: Vec<&str> = request
        .non_blank_tasks()
        .into_iter()
        .map(|t| t.trim_end_matches('.').trim_end())
        .filter(|t| !t.is_empty())
        .collect();
    let action = if tasks.is_empty() {
        FALLBACK_ROUTINE_ACTION.to_string()
    } else {
        format!("Completed: {}.", tasks.join("; "))
    };

    DarDocument {
        data: clip_field(&data),
        action: clip_field(&action),
        response: FALLBACK_RESPONSE.to_string(),
        summary: None,
        concerns: vec![],
        follow_up: vec![FALLBACK_FOLLOW_UP.to_string()],
    }
}

fn clip_field(text: &str) -> String {
    truncate_chars(text, MAX_FIELD_CHARS).trim_end().to_string()
}
