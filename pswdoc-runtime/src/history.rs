use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use pswdoc_core::dar::DarDocument;
use pswdoc_core::report::ReportRequest;
use pswdoc_engine::outcome::ReportOutcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ts_unix_ms: i64,
    pub client_name: Option<String>,
    pub shift_date: Option<String>,
    /// `model` or `fallback`.
    pub source: String,
    pub document: DarDocument,
}

impl HistoryEntry {
    /// Snapshot of a generated note, stamped with the current time.
    pub fn record(request: &ReportRequest, outcome: &ReportOutcome) -> Self {
        Self {
            ts_unix_ms: now_unix_ms(),
            client_name: request.client_name.clone(),
            shift_date: request.shift_date.clone(),
            source: outcome.source.label().into(),
            document: outcome.document.clone(),
        }
    }
}

/// Notes generated on this machine, kept oldest first in one JSON file.
///
/// Clones share a lock, so appends from concurrent requests never drop entries.
/// A file that no longer parses is moved aside as `*.corrupt` and history restarts.
#[derive(Debug, Clone)]
pub struct ReportHistory {
    path: PathBuf,
    max_entries: usize,
    lock: Arc<Mutex<()>>,
}

impl ReportHistory {
    pub fn new(path: PathBuf, max_entries: usize) -> Self {
        Self {
            path,
            max_entries: max_entries.max(1),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Newest first, at most `limit` notes.
    pub fn recent(&self, limit: usize) -> anyhow::Result<Vec<HistoryEntry>> {
        let _guard = self.guard();
        let mut entries = self.read_entries()?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    /// Records a note, evicting the oldest ones beyond `max_entries`.
    pub fn append(&self, entry: HistoryEntry) -> anyhow::Result<()> {
        let _guard = self.guard();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create report history dir {}", parent.display()))?;
        }

        let mut entries = self.read_entries()?;
        entries.push(entry);
        let excess = entries.len().saturating_sub(self.max_entries);
        entries.drain(..excess);

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&entries)?)
            .with_context(|| format!("write report history {}", tmp.display()))?;
        crate::replace_file(&tmp, &self.path)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_entries(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read report history {}", self.path.display())));
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                let aside = self.path.with_extension("json.corrupt");
                log::warn!(
                    "report history {} is unreadable ({e}); moving it to {}",
                    self.path.display(),
                    aside.display()
                );
                fs::rename(&self.path, &aside).with_context(|| {
                    format!("move corrupt report history to {}", aside.display())
                })?;
                Ok(vec![])
            }
        }
    }
}

pub fn now_unix_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ts: i64, data: &str) -> HistoryEntry {
        HistoryEntry {
            ts_unix_ms: ts,
            client_name: None,
            shift_date: None,
            source: "model".into(),
            document: DarDocument {
                data: data.into(),
                action: "a".into(),
                response: "r".into(),
                summary: None,
                concerns: vec![],
                follow_up: vec![],
            },
        }
    }

    fn data(entries: &[HistoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.document.data.as_str()).collect()
    }

    #[test]
    fn evicts_oldest_and_lists_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let history = ReportHistory::new(dir.path().join("nested").join("history.json"), 2);

        history.append(entry(1, "a")).unwrap();
        history.append(entry(2, "b")).unwrap();
        history.append(entry(3, "c")).unwrap();

        assert_eq!(data(&history.recent(10).unwrap()), vec!["c", "b"]);
        assert_eq!(data(&history.recent(1).unwrap()), vec!["c"]);
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let history = ReportHistory::new(dir.path().join("history.json"), 5);
        assert!(history.recent(5).unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_moved_aside_and_history_continues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "[{\"ts_unix_ms\":1,").unwrap();
        let history = ReportHistory::new(path.clone(), 5);

        history.append(entry(7, "after")).unwrap();

        assert_eq!(data(&history.recent(5).unwrap()), vec!["after"]);
        assert_eq!(
            std::fs::read_to_string(path.with_extension("json.corrupt")).unwrap(),
            "[{\"ts_unix_ms\":1,"
        );
    }

    #[test]
    fn concurrent_appends_keep_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let history = ReportHistory::new(dir.path().join("history.json"), 100);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let history = history.clone();
                std::thread::spawn(move || history.append(entry(i, "x")).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(history.recent(100).unwrap().len(), 8);
    }
}
