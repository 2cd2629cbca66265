// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Warden - keeps parallel coding agents out of each other's way.
//!
//! Several autonomous agents editing one code tree at the same time need two
//! guarantees: no two agents write the same files, and agents that are only
//! supposed to look cannot change anything. Warden provides both, plus the
//! workspace plumbing around them.
//!
//! # Architecture
//!
//! - [`permissions`] - Roles, capability records, path globs and the session registry
//! - [`intercept`] - The choke point every agent tool call passes through
//! - [`orchestrate`] - Per-agent workspaces: lifecycle, status, merge, verification
//! - [`events`] - Append-only JSONL event log
//! - [`config`] - Configuration loading and merging
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```rust,ignore
//! use warden::intercept::{Action, ActionInterceptor};
//! use warden::permissions::{BoundWorkspace, PermissionRegistry, Registration, Role};
//!
//! let registry = PermissionRegistry::new();
//! registry
//!     .register(
//!         Registration::new("agent-1", Role::Implementer)
//!             .with_allowed_paths(["src/backend/**"])
//!             .bound_to(BoundWorkspace::new("feat/api", "/src/warden-feat-api")),
//!     )
//!     .await;
//!
//! let interceptor = ActionInterceptor::new(registry);
//! let decision = interceptor.authorize("agent-1", &Action::write("src/frontend/app.js")).await;
//! assert!(decision.is_denied());
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod intercept;
pub mod orchestrate;
pub mod permissions;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use error::{ConfigError, Result};
pub use events::{EventLevel, EventLog, EventRecord};
pub use intercept::{Action, ActionInterceptor, Interception};
pub use orchestrate::{
    MergeCoordinator, MergeOutcome, StatusSummary, Workspace, WorkspaceError, WorkspaceManager,
    WorkspaceState,
};
pub use permissions::{
    matches, CapabilityRecord, Decision, DenyReason, PermissionRegistry, Registration, Role,
};

/// Warden version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
