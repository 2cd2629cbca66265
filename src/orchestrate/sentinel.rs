// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Sentinel files: the durable state of a workspace.
//!
//! Each workspace keeps a `.warden-state/` directory at its root holding up to
//! four files:
//!
//! | file      | written by     | meaning                              |
//! |-----------|----------------|--------------------------------------|
//! | `task`    | create         | immutable task description + header  |
//! | `done`    | mark_done      | work finished, ready to merge        |
//! | `blocked` | mark_blocked   | waiting on something external        |
//! | `errored` | mark_errored   | failed; needs attention              |
//!
//! Presence drives state; file contents are for humans. The directory
//! carries its own `.gitignore` so sentinels never show up in the branch.
//! Writes are plain file writes with no locking; the last writer wins.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Name of the state directory inside a workspace.
pub const STATE_DIR: &str = ".warden-state";

/// One sentinel file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    Task,
    Done,
    Blocked,
    Errored,
}

impl Sentinel {
    pub const TERMINAL: [Sentinel; 3] = [Sentinel::Done, Sentinel::Blocked, Sentinel::Errored];

    /// File name on disk.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::Errored => "errored",
        }
    }
}

/// Derived workspace state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkspaceState {
    InProgress,
    Done,
    Blocked,
    Errored,
}

impl WorkspaceState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for WorkspaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of the `task` sentinel.
///
/// ```text
/// branch: feat/auth
/// base: main
/// created: 2026-03-01T12:00:00+00:00
///
/// Implement the OAuth2 login flow.
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFile {
    pub branch: String,
    pub base: String,
    pub created_at: Option<DateTime<Utc>>,
    pub description: String,
}

impl TaskFile {
    pub fn new(branch: impl Into<String>, base: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            base: base.into(),
            created_at: Some(Utc::now()),
            description: description.into(),
        }
    }

    pub fn render(&self) -> String {
        let created = self
            .created_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        format!(
            "branch: {}\nbase: {}\ncreated: {}\n\n{}\n",
            self.branch,
            self.base,
            created,
            self.description.trim_end()
        )
    }

    /// Parse a task file. Missing header fields come back empty; a file
    /// without a header is all description.
    pub fn parse(content: &str) -> Self {
        let mut task = Self {
            branch: String::new(),
            base: String::new(),
            created_at: None,
            description: String::new(),
        };

        let (header, body) = match content.split_once("\n\n") {
            Some((header, body)) if looks_like_header(header) => (header, body),
            _ => ("", content),
        };

        for line in header.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "branch" => task.branch = value.to_string(),
                "base" => task.base = value.to_string(),
                "created" => {
                    task.created_at = DateTime::parse_from_rfc3339(value)
                        .ok()
                        .map(|t| t.with_timezone(&Utc))
                }
                _ => {}
            }
        }

        task.description = body.trim_end().to_string();
        task
    }
}

fn looks_like_header(header: &str) -> bool {
    header
        .lines()
        .all(|line| matches!(line.split_once(':'), Some((key, _)) if ["branch", "base", "created"].contains(&key.trim())))
}

/// Handle on a workspace's state directory.
#[derive(Debug, Clone)]
pub struct SentinelDir {
    dir: PathBuf,
}

impl SentinelDir {
    /// State directory for the workspace rooted at `root`.
    pub fn for_workspace(root: &Path) -> Self {
        Self {
            dir: root.join(STATE_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, sentinel: Sentinel) -> PathBuf {
        self.dir.join(sentinel.file_name())
    }

    /// Create the directory and its `.gitignore`.
    pub fn init(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let ignore = self.dir.join(".gitignore");
        if !ignore.exists() {
            fs::write(ignore, "*\n")?;
        }
        Ok(())
    }

    pub fn exists(&self, sentinel: Sentinel) -> bool {
        self.path(sentinel).is_file()
    }

    /// Sentinel contents, or `None` if absent.
    pub fn read(&self, sentinel: Sentinel) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(sentinel)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write the task sentinel. Fails with `AlreadyExists` if one is present.
    pub fn write_task(&self, task: &TaskFile) -> io::Result<()> {
        self.init()?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path(Sentinel::Task))?;
        file.write_all(task.render().as_bytes())
    }

    pub fn read_task(&self) -> io::Result<Option<TaskFile>> {
        Ok(self.read(Sentinel::Task)?.map(|content| TaskFile::parse(&content)))
    }

    /// Write `done`, then clear `errored` and `blocked`.
    pub fn mark_done(&self, summary: &str) -> io::Result<()> {
        self.write(Sentinel::Done, summary)?;
        self.clear(Sentinel::Errored)?;
        self.clear(Sentinel::Blocked)
    }

    /// Clear `done`, then write `blocked`. `errored` is left alone.
    pub fn mark_blocked(&self, reason: &str) -> io::Result<()> {
        self.clear(Sentinel::Done)?;
        self.write(Sentinel::Blocked, reason)
    }

    /// Clear `done`, then write `errored`.
    pub fn mark_errored(&self, details: &str) -> io::Result<()> {
        self.clear(Sentinel::Done)?;
        self.write(Sentinel::Errored, details)
    }

    /// Clear every terminal sentinel.
    pub fn reopen(&self) -> io::Result<()> {
        for sentinel in Sentinel::TERMINAL {
            self.clear(sentinel)?;
        }
        Ok(())
    }

    /// State by priority: done > blocked > errored > in-progress.
    pub fn state(&self) -> WorkspaceState {
        if self.exists(Sentinel::Done) {
            WorkspaceState::Done
        } else if self.exists(Sentinel::Blocked) {
            WorkspaceState::Blocked
        } else if self.exists(Sentinel::Errored) {
            WorkspaceState::Errored
        } else {
            WorkspaceState::InProgress
        }
    }

    fn write(&self, sentinel: Sentinel, content: &str) -> io::Result<()> {
        self.init()?;
        let mut content = content.trim_end().to_string();
        content.push('\n');
        fs::write(self.path(sentinel), content)
    }

    fn clear(&self, sentinel: Sentinel) -> io::Result<()> {
        match fs::remove_file(self.path(sentinel)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
