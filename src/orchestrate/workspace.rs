// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Workspace lifecycle.
//!
//! A workspace is a separate checkout of one branch, created next to the
//! main checkout, where a single agent works undisturbed.
//!
//! ```text
//!            create
//!              │
//!              ▼
//!   ┌──── in-progress ◄──────── reopen ─────────┐
//!   │          │                                │
//!   │   mark_done / mark_blocked / mark_errored │
//!   ▼          ▼                                │
//! done ── mark_errored ──► errored ─────────────┤
//!                          blocked ─────────────┘
//! ```
//!
//! The state lives entirely in sentinel files (see [`super::sentinel`]), so a
//! manager can be dropped and recreated at any time without losing anything.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::paths::{is_valid_branch_name, WorkspaceLayout};
use super::sentinel::{Sentinel, SentinelDir, TaskFile, WorkspaceState, STATE_DIR};
use super::vcs::{Vcs, VcsError};
use crate::events::EventLog;

/// Errors from workspace operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Workspace already exists: {name} at {}", .path.display())]
    AlreadyExists { name: String, path: PathBuf },

    #[error("Workspace not found: {0}")]
    NotFound(String),

    #[error("Workspace {0} is not marked done (use force to remove it anyway)")]
    NotDone(String),

    #[error("Invalid workspace name: {0:?}")]
    InvalidName(String),

    #[error("{op} failed: {detail}")]
    Vcs { op: String, detail: String },

    #[error(transparent)]
    Spawn(#[from] VcsError),

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WorkspaceError {
    fn vcs(op: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Vcs {
            op: op.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this is a "does not exist" error rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A workspace as read from disk.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Branch name.
    pub name: String,
    pub root: PathBuf,
    pub base_branch: String,
    pub created_at: Option<DateTime<Utc>>,
    pub task: String,
    pub state: WorkspaceState,
    /// Contents of the sentinel that determines `state`, if any.
    pub note: Option<String>,
}

impl Workspace {
    pub fn sentinels(&self) -> SentinelDir {
        SentinelDir::for_workspace(&self.root)
    }

    fn load(root: &Path, fallback_name: &str) -> Result<Option<Self>, WorkspaceError> {
        let sentinels = SentinelDir::for_workspace(root);
        let Some(task) = sentinels
            .read_task()
            .map_err(WorkspaceError::io(sentinels.dir()))?
        else {
            return Ok(None);
        };

        let state = sentinels.state();
        let note = match state {
            WorkspaceState::InProgress => None,
            WorkspaceState::Done => sentinels.read(Sentinel::Done).ok().flatten(),
            WorkspaceState::Blocked => sentinels.read(Sentinel::Blocked).ok().flatten(),
            WorkspaceState::Errored => sentinels.read(Sentinel::Errored).ok().flatten(),
        }
        .map(|note| note.trim_end().to_string());

        let name = if task.branch.is_empty() {
            fallback_name.to_string()
        } else {
            task.branch
        };

        Ok(Some(Self {
            name,
            root: root.to_path_buf(),
            base_branch: task.base,
            created_at: task.created_at,
            task: task.description,
            state,
            note,
        }))
    }
}

/// Creates, inspects, transitions and removes workspaces.
#[derive(Clone)]
pub struct WorkspaceManager {
    vcs: Arc<dyn Vcs>,
    layout: WorkspaceLayout,
    base_branch: Option<String>,
    events: EventLog,
}

impl std::fmt::Debug for WorkspaceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceManager")
            .field("layout", &self.layout)
            .field("base_branch", &self.base_branch)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl WorkspaceManager {
    pub fn new(vcs: Arc<dyn Vcs>, layout: WorkspaceLayout) -> Self {
        Self {
            vcs,
            layout,
            base_branch: None,
            events: EventLog::disabled(),
        }
    }

    /// Fix the integration branch instead of asking the VCS for it.
    pub fn with_base_branch(mut self, base_branch: Option<String>) -> Self {
        self.base_branch = base_branch;
        self
    }

    pub fn with_event_log(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    pub fn vcs(&self) -> &Arc<dyn Vcs> {
        &self.vcs
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub(crate) fn events(&self) -> &EventLog {
        &self.events
    }

    /// Branch workspaces fork from and merge into.
    ///
    /// The configured base branch, or whatever the main checkout has checked out.
    pub async fn integration_branch(&self) -> Result<String, WorkspaceError> {
        if let Some(base) = &self.base_branch {
            return Ok(base.clone());
        }
        let output = self.vcs.current_branch().await?;
        let branch = output.stdout.trim();
        if !output.success || branch.is_empty() {
            return Err(WorkspaceError::vcs(
                "current branch",
                if output.success {
                    "main checkout is not on a branch".to_string()
                } else {
                    output.combined()
                },
            ));
        }
        Ok(branch.to_string())
    }

    /// Create a workspace for `branch` and record its task.
    ///
    /// An existing branch is attached as-is; otherwise the branch is created
    /// from the integration branch.
    pub async fn create(&self, branch: &str, task: &str) -> Result<Workspace, WorkspaceError> {
        if !is_valid_branch_name(branch) {
            return Err(WorkspaceError::InvalidName(branch.to_string()));
        }

        let root = self.layout.path_for(branch);
        if root.exists() {
            return Err(WorkspaceError::AlreadyExists {
                name: branch.to_string(),
                path: root,
            });
        }

        let base = self.integration_branch().await?;

        let output = if self.vcs.branch_exists(branch).await? {
            self.vcs.add_worktree(&root, branch).await?
        } else {
            self.vcs.add_worktree_new_branch(&root, branch, &base).await?
        };
        if !output.success {
            return Err(WorkspaceError::vcs("worktree add", output.combined()));
        }

        let task_file = TaskFile::new(branch, base.as_str(), task);
        let sentinels = SentinelDir::for_workspace(&root);
        if let Err(e) = sentinels.write_task(&task_file) {
            warn!(workspace = %branch, "Failed to write task sentinel, rolling back: {}", e);
            if let Err(rollback) = self.vcs.remove_worktree(&root, true).await {
                warn!(workspace = %branch, "Rollback failed: {}", rollback);
            }
            return Err(WorkspaceError::io(sentinels.dir())(e));
        }

        info!(workspace = %branch, base = %base, root = %root.display(), "Created workspace");
        self.events.info(
            "workspace created",
            json!({ "workspace": branch, "base": base, "root": root }),
        );

        Ok(Workspace {
            name: branch.to_string(),
            root,
            base_branch: base,
            created_at: task_file.created_at,
            task: task_file.description,
            state: WorkspaceState::InProgress,
            note: None,
        })
    }

    /// Look up a workspace by branch name.
    ///
    /// The branch recorded in the task header must match `name` exactly.
    pub fn get(&self, name: &str) -> Result<Workspace, WorkspaceError> {
        let root = self.layout.path_for(name);
        if !root.is_dir() {
            return Err(WorkspaceError::NotFound(name.to_string()));
        }
        match Workspace::load(&root, name)? {
            Some(workspace) if workspace.name == name => Ok(workspace),
            Some(workspace) => {
                warn!(
                    requested = %name,
                    recorded = %workspace.name,
                    root = %root.display(),
                    "Workspace directory belongs to another branch"
                );
                Err(WorkspaceError::NotFound(name.to_string()))
            }
            None => Err(WorkspaceError::NotFound(name.to_string())),
        }
    }

    /// Every workspace under the layout's base directory, sorted by name.
    pub fn list(&self) -> Result<Vec<Workspace>, WorkspaceError> {
        if !self.layout.base_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut workspaces = Vec::new();
        for entry in WalkDir::new(&self.layout.base_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy();
            let Some(branch) = self.layout.branch_for(&dir_name) else {
                continue;
            };
            if !entry.path().join(STATE_DIR).is_dir() {
                continue;
            }
            if let Some(workspace) = Workspace::load(entry.path(), &branch)? {
                workspaces.push(workspace);
            }
        }

        workspaces.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(workspaces)
    }

    /// Mark finished. Clears `errored` and `blocked`. Idempotent.
    pub fn mark_done(&self, name: &str, summary: &str) -> Result<WorkspaceState, WorkspaceError> {
        self.transition(name, "done", summary, |s| s.mark_done(summary))
    }

    /// Mark blocked. Clears `done`, keeps `errored`.
    pub fn mark_blocked(&self, name: &str, reason: &str) -> Result<WorkspaceState, WorkspaceError> {
        self.transition(name, "blocked", reason, |s| s.mark_blocked(reason))
    }

    /// Mark errored. Clears `done`.
    pub fn mark_errored(&self, name: &str, details: &str) -> Result<WorkspaceState, WorkspaceError> {
        self.transition(name, "errored", details, |s| s.mark_errored(details))
    }

    /// Clear every terminal sentinel, returning the workspace to in-progress.
    pub fn reopen(&self, name: &str) -> Result<WorkspaceState, WorkspaceError> {
        self.transition(name, "reopened", "", SentinelDir::reopen)
    }

    fn transition<F>(
        &self,
        name: &str,
        label: &str,
        note: &str,
        apply: F,
    ) -> Result<WorkspaceState, WorkspaceError>
    where
        F: FnOnce(&SentinelDir) -> io::Result<()>,
    {
        let workspace = self.get(name)?;
        let sentinels = workspace.sentinels();
        let previous = workspace.state;

        apply(&sentinels).map_err(WorkspaceError::io(sentinels.dir()))?;
        let state = sentinels.state();

        info!(workspace = %name, from = %previous, to = %state, "Workspace {}", label);
        let level_context = json!({
            "workspace": name,
            "from": previous,
            "to": state,
            "note": note,
        });
        if state == WorkspaceState::Errored {
            self.events.error(format!("workspace {label}"), level_context);
        } else {
            self.events.info(format!("workspace {label}"), level_context);
        }

        Ok(state)
    }

    /// Remove a workspace's checkout. The branch itself is kept.
    ///
    /// Refuses unless the workspace is done, or `force` is set. A forced
    /// removal that the VCS rejects falls back to deleting the directory and
    /// pruning.
    pub async fn remove(&self, name: &str, force: bool) -> Result<(), WorkspaceError> {
        let workspace = self.get(name)?;
        if !force && !workspace.sentinels().exists(Sentinel::Done) {
            return Err(WorkspaceError::NotDone(name.to_string()));
        }

        let output = self.vcs.remove_worktree(&workspace.root, force).await?;
        if !output.success {
            if !force {
                return Err(WorkspaceError::vcs("worktree remove", output.combined()));
            }
            warn!(workspace = %name, "VCS refused removal, deleting directly: {}", output.combined());
            if workspace.root.exists() {
                std::fs::remove_dir_all(&workspace.root)
                    .map_err(WorkspaceError::io(&workspace.root))?;
            }
            let pruned = self.vcs.prune_worktrees().await?;
            if !pruned.success {
                warn!(workspace = %name, "Prune failed: {}", pruned.combined());
            }
        }

        info!(workspace = %name, force, "Removed workspace");
        self.events.info(
            "workspace removed",
            json!({ "workspace": name, "force": force, "state": workspace.state }),
        );
        Ok(())
    }
}
