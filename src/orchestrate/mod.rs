// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Workspace orchestration for parallel agents.
//!
//! Each agent gets its own checkout of its own branch (a *workspace*), so
//! agents never share a working tree. The coordinator drives workspaces
//! through their lifecycle and merges finished ones back:
//!
//! ```text
//! WorkspaceManager::create ──► agent works ──► mark_done
//!                                   │              │
//!                                   ▼              ▼
//!                       mark_blocked/errored   verify ──fail──► errored
//!                                                  │
//!                                                  ▼
//!                                     MergeCoordinator::merge
//!                                                  │
//!                                                  ▼
//!                                     WorkspaceManager::remove
//! ```
//!
//! Version control is reached only through the [`Vcs`] trait; [`GitCli`] is
//! the production implementation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden::orchestrate::{GitCli, MergeCoordinator, WorkspaceLayout, WorkspaceManager};
//!
//! let vcs = Arc::new(GitCli::new("/src/project"));
//! let manager = WorkspaceManager::new(vcs, WorkspaceLayout::new("/src", "warden-"));
//!
//! let ws = manager.create("feat/auth", "Implement OAuth2 login").await?;
//! // ... agent runs in ws.root ...
//! manager.mark_done("feat/auth", "login works")?;
//! MergeCoordinator::new(&manager).merge("feat/auth").await?;
//! manager.remove("feat/auth", false).await?;
//! ```

pub mod merge;
pub mod paths;
pub mod sentinel;
pub mod status;
pub mod vcs;
pub mod verify;
pub mod workspace;

pub use merge::{MergeCoordinator, MergeOutcome};
pub use paths::{
    decode_branch_name, encode_branch_name, find_repo_root, is_valid_branch_name, WorkspaceLayout,
};
pub use sentinel::{Sentinel, SentinelDir, TaskFile, WorkspaceState, STATE_DIR};
pub use status::{summarize, StatusRow, StatusSummary};
pub use vcs::{GitCli, Vcs, VcsError, VcsOutput};
pub use verify::{detect_test_command, Verifier, VerifyOutcome};
pub use workspace::{Workspace, WorkspaceError, WorkspaceManager};
