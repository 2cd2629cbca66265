// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Status aggregation across all workspaces.

use serde::Serialize;

use super::sentinel::WorkspaceState;
use super::workspace::{Workspace, WorkspaceError, WorkspaceManager};

/// One line of the status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRow {
    pub name: String,
    pub state: WorkspaceState,
    /// First line of the task description.
    pub task: String,
    /// First line of the blocked/errored/done note.
    pub note: Option<String>,
}

/// Counts per state plus one row per workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total: usize,
    pub done: usize,
    pub blocked: usize,
    pub errored: usize,
    pub in_progress: usize,
    pub rows: Vec<StatusRow>,
}

impl StatusSummary {
    /// Every workspace is done.
    pub fn all_done(&self) -> bool {
        self.total > 0 && self.done == self.total
    }

    /// Something needs a human.
    pub fn needs_attention(&self) -> bool {
        self.blocked > 0 || self.errored > 0
    }
}

/// Summarize workspaces. Each one is counted exactly once, under its
/// derived state.
pub fn summarize(workspaces: &[Workspace]) -> StatusSummary {
    let mut summary = StatusSummary {
        total: workspaces.len(),
        ..Default::default()
    };

    for workspace in workspaces {
        match workspace.state {
            WorkspaceState::Done => summary.done += 1,
            WorkspaceState::Blocked => summary.blocked += 1,
            WorkspaceState::Errored => summary.errored += 1,
            WorkspaceState::InProgress => summary.in_progress += 1,
        }
        summary.rows.push(StatusRow {
            name: workspace.name.clone(),
            state: workspace.state,
            task: first_line(&workspace.task),
            note: workspace.note.as_deref().map(first_line),
        });
    }

    summary
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

impl WorkspaceManager {
    /// Scan every workspace and summarize its sentinel state.
    pub fn status(&self) -> Result<StatusSummary, WorkspaceError> {
        Ok(summarize(&self.list()?))
    }
}
