// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Merging finished workspaces back into the integration branch.
//!
//! A merge only happens when the workspace carries a `done` sentinel. The
//! check runs before any VCS command, so an unfinished workspace never
//! touches the main checkout. Merges always create a merge commit; a
//! conflicted merge is aborted and the raw VCS output handed back.

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::sentinel::Sentinel;
use super::workspace::{WorkspaceError, WorkspaceManager};

/// Outcome of a merge attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// Merge commit created on `target`.
    Merged {
        branch: String,
        target: String,
        output: String,
    },
    /// Conflicts; the merge was aborted.
    Conflict {
        branch: String,
        target: String,
        files: Vec<String>,
        output: String,
        aborted: bool,
    },
    /// The VCS rejected the merge for a reason other than conflicts.
    Failed { reason: String },
    /// Precondition not met; no VCS command was issued.
    Denied { reason: String },
}

impl MergeOutcome {
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// Merges workspaces managed by a [`WorkspaceManager`].
pub struct MergeCoordinator<'a> {
    manager: &'a WorkspaceManager,
}

impl<'a> MergeCoordinator<'a> {
    pub fn new(manager: &'a WorkspaceManager) -> Self {
        Self { manager }
    }

    /// Merge the named workspace's branch into the integration branch.
    ///
    /// Errors only for a missing workspace or a VCS that cannot be run;
    /// everything else is an outcome.
    pub async fn merge(&self, name: &str) -> Result<MergeOutcome, WorkspaceError> {
        let workspace = self.manager.get(name)?;
        let events = self.manager.events();

        if !workspace.sentinels().exists(Sentinel::Done) {
            let reason = format!(
                "workspace {name} is not marked done (state: {})",
                workspace.state
            );
            warn!(workspace = %name, "Merge denied: {}", reason);
            events.warn("merge denied", json!({ "workspace": name, "reason": reason }));
            return Ok(MergeOutcome::Denied { reason });
        }

        let vcs = self.manager.vcs();
        let target = self.manager.integration_branch().await?;

        let current = vcs.current_branch().await?;
        if current.stdout.trim() != target {
            let output = vcs.checkout(&target).await?;
            if !output.success {
                let reason = format!("checkout {target} failed: {}", output.combined());
                return Ok(self.failed(name, reason));
            }
        }

        let message = format!("Merge workspace {name}");
        let output = vcs.merge_no_ff(&workspace.name, &message).await?;
        if output.success {
            info!(workspace = %name, target = %target, "Merged workspace");
            events.info("workspace merged", json!({ "workspace": name, "target": target }));
            return Ok(MergeOutcome::Merged {
                branch: workspace.name,
                target,
                output: output.combined(),
            });
        }

        let files = vcs.conflicted_files().await?;
        if files.is_empty() {
            return Ok(self.failed(name, output.combined()));
        }

        let abort = vcs.merge_abort().await?;
        if !abort.success {
            warn!(workspace = %name, "Merge abort failed: {}", abort.combined());
        }
        warn!(workspace = %name, target = %target, files = ?files, "Merge conflict");
        events.warn(
            "merge conflict",
            json!({ "workspace": name, "target": target, "files": files }),
        );

        Ok(MergeOutcome::Conflict {
            branch: workspace.name,
            target,
            files,
            output: output.combined(),
            aborted: abort.success,
        })
    }

    fn failed(&self, name: &str, reason: String) -> MergeOutcome {
        warn!(workspace = %name, "Merge failed: {}", reason);
        self.manager
            .events()
            .error("merge failed", json!({ "workspace": name, "reason": reason }));
        MergeOutcome::Failed { reason }
    }
}
