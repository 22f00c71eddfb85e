use pswdoc_core::dar::{DarDocument, ValidationIssue};
use pswdoc_core::extract::ExtractionMethod;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStage {
    Prompting,
    Generating,
    Extracting,
    Validating,
    Done,
}

impl ReportStage {
    // Stable labels for logs and progress hooks; not derived from `Debug`.
    pub fn label(self) -> &'static str {
        match self {
            ReportStage::Prompting => "prompting",
            ReportStage::Generating => "generating",
            ReportStage::Extracting => "extracting",
            ReportStage::Validating => "validating",
            ReportStage::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    LlmUnavailable(String),
    NoJson(String),
    Invalid(Vec<ValidationIssue>),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::LlmUnavailable(e) => write!(f, "LLM unavailable: {e}"),
            FallbackReason::NoJson(e) => write!(f, "no usable JSON: {e}"),
            FallbackReason::Invalid(issues) => {
                let joined = issues
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "schema validation failed: {joined}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportSource {
    Model {
        model: String,
        method: ExtractionMethod,
    },
    Fallback {
        reason: FallbackReason,
    },
}

impl ReportSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ReportSource::Fallback { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportSource::Model { .. } => "model",
            ReportSource::Fallback { .. } => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportTimings {
    pub generation_ms: Option<u64>,
    pub total_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub document: DarDocument,
    pub source: ReportSource,
    /// Model text as received, kept for audit when the note had to be synthesized.
    pub raw_output: Option<String>,
    pub timings: ReportTimings,
}

pub fn ms(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}
