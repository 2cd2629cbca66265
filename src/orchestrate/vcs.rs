// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Version-control collaborator.
//!
//! Every operation reports `(success, stdout, stderr)` as a [`VcsOutput`].
//! A non-zero exit is not an error at this level; only failing to run the
//! command at all is ([`VcsError`]). Callers decide what a failed command
//! means for them.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

/// Result of one VCS command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl VcsOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// stdout and stderr joined, trimmed. What a human would have seen.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (false, true) => stdout.to_string(),
            (false, false) => format!("{stdout}\n{stderr}"),
        }
    }
}

/// The VCS could not be invoked.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Operations the workspace manager and merge coordinator need from version
/// control. All commands run against the main checkout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Whether a local branch exists.
    async fn branch_exists(&self, branch: &str) -> Result<bool, VcsError>;

    /// Branch checked out in the main checkout.
    async fn current_branch(&self) -> Result<VcsOutput, VcsError>;

    /// Attach an existing branch at `path`.
    async fn add_worktree(&self, path: &Path, branch: &str) -> Result<VcsOutput, VcsError>;

    /// Create `branch` from `base` and attach it at `path`.
    async fn add_worktree_new_branch(
        &self,
        path: &Path,
        branch: &str,
        base: &str,
    ) -> Result<VcsOutput, VcsError>;

    /// Detach the checkout at `path` and delete its directory.
    async fn remove_worktree(&self, path: &Path, force: bool) -> Result<VcsOutput, VcsError>;

    /// Drop bookkeeping for checkouts whose directories are gone.
    async fn prune_worktrees(&self) -> Result<VcsOutput, VcsError>;

    /// Switch the main checkout to `branch`.
    async fn checkout(&self, branch: &str) -> Result<VcsOutput, VcsError>;

    /// Merge `branch` into the current branch, always creating a merge commit.
    async fn merge_no_ff(&self, branch: &str, message: &str) -> Result<VcsOutput, VcsError>;

    /// Abort an in-progress merge.
    async fn merge_abort(&self) -> Result<VcsOutput, VcsError>;

    /// Paths with unresolved conflicts in the main checkout.
    async fn conflicted_files(&self) -> Result<Vec<String>, VcsError>;
}

/// [`Vcs`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    async fn git(&self, args: &[&str]) -> Result<VcsOutput, VcsError> {
        trace!(args = ?args, "git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| VcsError::Spawn {
                command: format!("git {}", args.join(" ")),
                source,
            })?;

        Ok(VcsOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn branch_exists(&self, branch: &str) -> Result<bool, VcsError> {
        let reference = format!("refs/heads/{branch}");
        let output = self
            .git(&["rev-parse", "--verify", "--quiet", &reference])
            .await?;
        Ok(output.success)
    }

    async fn current_branch(&self) -> Result<VcsOutput, VcsError> {
        let mut output = self.git(&["branch", "--show-current"]).await?;
        output.stdout = output.stdout.trim().to_string();
        Ok(output)
    }

    async fn add_worktree(&self, path: &Path, branch: &str) -> Result<VcsOutput, VcsError> {
        let path = path.to_string_lossy();
        self.git(&["worktree", "add", &path, branch]).await
    }

    async fn add_worktree_new_branch(
        &self,
        path: &Path,
        branch: &str,
        base: &str,
    ) -> Result<VcsOutput, VcsError> {
        let path = path.to_string_lossy();
        self.git(&["worktree", "add", "-b", branch, &path, base]).await
    }

    async fn remove_worktree(&self, path: &Path, force: bool) -> Result<VcsOutput, VcsError> {
        let path = path.to_string_lossy();
        if force {
            self.git(&["worktree", "remove", "--force", &path]).await
        } else {
            self.git(&["worktree", "remove", &path]).await
        }
    }

    async fn prune_worktrees(&self) -> Result<VcsOutput, VcsError> {
        self.git(&["worktree", "prune"]).await
    }

    async fn checkout(&self, branch: &str) -> Result<VcsOutput, VcsError> {
        self.git(&["checkout", branch]).await
    }

    async fn merge_no_ff(&self, branch: &str, message: &str) -> Result<VcsOutput, VcsError> {
        self.git(&["merge", "--no-ff", "-m", message, branch]).await
    }

    async fn merge_abort(&self) -> Result<VcsOutput, VcsError> {
        self.git(&["merge", "--abort"]).await
    }

    async fn conflicted_files(&self) -> Result<Vec<String>, VcsError> {
        let output = self
            .git(&["diff", "--name-only", "--diff-filter=U"])
            .await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
