// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Append-only event log.
//!
//! Each record is one JSON object per line:
//!
//! ```text
//! {"timestamp":"2026-01-01T00:00:00Z","level":"info","message":"workspace created","context":{...}}
//! ```
//!
//! Writing is best-effort. A failed append is reported through `tracing` and
//! otherwise ignored; it never fails the operation being logged.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One line of the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub message: String,
    #[serde(default)]
    pub context: serde_json::Value,
}

/// Handle to an event log file. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    /// Log to the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A log that drops everything.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Append a record. Never fails.
    pub fn append(&self, level: EventLevel, message: impl Into<String>, context: serde_json::Value) {
        let Some(path) = &self.path else {
            return;
        };

        let record = EventRecord {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            context,
        };

        if let Err(e) = write_record(path, &record) {
            tracing::warn!("Failed to append event to {:?}: {}", path, e);
        }
    }

    pub fn info(&self, message: impl Into<String>, context: serde_json::Value) {
        self.append(EventLevel::Info, message, context);
    }

    pub fn warn(&self, message: impl Into<String>, context: serde_json::Value) {
        self.append(EventLevel::Warn, message, context);
    }

    pub fn error(&self, message: impl Into<String>, context: serde_json::Value) {
        self.append(EventLevel::Error, message, context);
    }

    /// Read back all parseable records. Malformed lines are skipped.
    pub fn read_all(&self) -> std::io::Result<Vec<EventRecord>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

fn write_record(path: &Path, record: &EventRecord) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut line = serde_json::to_string(record)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    line.push('\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_read_back() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path().join("nested/events.jsonl"));

        log.info("workspace created", json!({"workspace": "feat/a"}));
        log.warn("action denied", json!({"session": "s1"}));

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "workspace created");
        assert_eq!(records[0].level, EventLevel::Info);
        assert_eq!(records[0].context["workspace"], "feat/a");
        assert_eq!(records[1].level, EventLevel::Warn);
    }

    #[test]
    fn test_records_are_single_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = EventLog::new(&path);

        log.info("multi\nline", json!({"text": "a\nb"}));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        for key in ["timestamp", "level", "message", "context"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes every append fail
        let path = dir.path().join("events.jsonl");
        std::fs::create_dir_all(&path).unwrap();

        let log = EventLog::new(&path);
        log.error("still fine", json!({}));
    }

    #[test]
    fn test_disabled_log() {
        let log = EventLog::disabled();
        assert!(!log.is_enabled());
        log.info("dropped", json!({}));
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        let log = EventLog::new(&path);
        log.info("ok", json!(null));
        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 1);
    }
}
