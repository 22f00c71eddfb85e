use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_INPUT_CHARS: usize = 20_000;

/// What a PSW submits at the end of a shift.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportRequest {
    pub client_name: Option<String>,
    pub shift_date: Option<String>,
    pub observations: String,
    pub tasks: Vec<String>,
    pub transcript: Option<String>,
    pub additional_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("nothing to document: observations, transcript and tasks are all empty")]
    NothingToDocument,
    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },
}

impl ReportRequest {
    pub fn validate(&self) -> Result<(), InputError> {
        let fields: [(&'static str, Option<&str>); 5] = [
            ("client_name", self.client_name.as_deref()),
            ("shift_date", self.shift_date.as_deref()),
            ("observations", Some(self.observations.as_str())),
            ("transcript", self.transcript.as_deref()),
            ("additional_notes", self.additional_notes.as_deref()),
        ];
        for (field, value) in fields {
            if value.is_some_and(|v| v.chars().count() > MAX_INPUT_CHARS) {
                return Err(InputError::TooLong {
                    field,
                    max: MAX_INPUT_CHARS,
                });
            }
        }

        let tasks_len: usize = self.tasks.iter().map(|t| t.chars().count()).sum();
        if tasks_len > MAX_INPUT_CHARS {
            return Err(InputError::TooLong {
                field: "tasks",
                max: MAX_INPUT_CHARS,
            });
        }

        let has_transcript = self
            .transcript
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if self.observations.trim().is_empty() && !has_transcript && self.non_blank_tasks().is_empty()
        {
            return Err(InputError::NothingToDocument);
        }
        Ok(())
    }

    /// Tasks with surrounding whitespace removed; blank entries are dropped.
    pub fn non_blank_tasks(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect()
    }
}
