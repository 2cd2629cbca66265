// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! [`WardenConfig`] is the on-disk shape (every field optional, camelCase
//! keys, JSON or YAML). [`ResolvedConfig`] is the result of layering all
//! sources over the defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::events::EventLog;
use crate::intercept::CommandDenylist;
use crate::orchestrate::WorkspaceLayout;
use crate::permissions::{RegistryPolicy, Role};

/// Default prefix for workspace directory names.
pub const DEFAULT_WORKTREE_PREFIX: &str = "warden-";

/// Default event log location, relative to the repository root.
pub const DEFAULT_EVENT_LOG: &str = ".warden/events.jsonl";

/// Default timeout for the verification command.
pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// Configuration file contents.
///
/// Found in `.warden.json`, `.warden/config.json` or `warden.config.json`
/// at the repository root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardenConfig {
    /// Deny mutating actions from unregistered sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_mode: Option<bool>,

    /// Integration branch that workspaces fork from and merge into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,

    /// Directory that holds workspace checkouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worktree_dir: Option<PathBuf>,

    /// Prefix for workspace directory names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worktree_prefix: Option<String>,

    /// Event log file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_log: Option<PathBuf>,

    /// Whether to write the event log at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_log_enabled: Option<bool>,

    /// Extra command regexes denied to read-only roles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dangerous_patterns: Option<Vec<String>>,

    /// Globs denied to every registered session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_denied_paths: Option<Vec<String>>,

    /// Per-role capability overrides, keyed by role name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<HashMap<String, RoleOverride>>,

    /// Verification command (overrides ecosystem detection)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,

    /// Verification timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_timeout_ms: Option<u64>,
}

/// Adjustments to one role's default capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_mutate: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_paths: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub denied_paths: Option<Vec<String>>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub strict_mode: bool,
    pub base_branch: Option<String>,
    pub worktree_dir: Option<PathBuf>,
    pub worktree_prefix: String,
    pub event_log: Option<PathBuf>,
    pub event_log_enabled: bool,
    pub dangerous_patterns: Vec<String>,
    pub default_denied_paths: Vec<String>,
    pub roles: HashMap<Role, RoleOverride>,
    pub test_command: Option<String>,
    pub test_timeout_ms: u64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            base_branch: None,
            worktree_dir: None,
            worktree_prefix: DEFAULT_WORKTREE_PREFIX.to_string(),
            event_log: None,
            event_log_enabled: true,
            dangerous_patterns: Vec::new(),
            default_denied_paths: Vec::new(),
            roles: HashMap::new(),
            test_command: None,
            test_timeout_ms: DEFAULT_TEST_TIMEOUT_MS,
        }
    }
}

impl ResolvedConfig {
    /// Policy for a [`PermissionRegistry`](crate::permissions::PermissionRegistry).
    pub fn registry_policy(&self) -> RegistryPolicy {
        RegistryPolicy {
            strict_mode: self.strict_mode,
            default_denied_paths: self.default_denied_paths.clone(),
            role_overrides: self.roles.clone(),
        }
    }

    /// Command denylist with configured extras.
    pub fn denylist(&self) -> CommandDenylist {
        CommandDenylist::new().with_extra_patterns(&self.dangerous_patterns)
    }

    /// Event log for a repository. Relative paths are taken from `repo_root`.
    pub fn event_log(&self, repo_root: &Path) -> EventLog {
        if !self.event_log_enabled {
            return EventLog::disabled();
        }
        let path = self
            .event_log
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EVENT_LOG));
        EventLog::new(anchor(repo_root, path))
    }

    /// Where workspace checkouts go for a repository.
    ///
    /// Defaults to siblings of the repository root.
    pub fn layout(&self, repo_root: &Path) -> WorkspaceLayout {
        let base_dir = match &self.worktree_dir {
            Some(dir) => anchor(repo_root, dir.clone()),
            None => repo_root
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| repo_root.to_path_buf()),
        };
        WorkspaceLayout::new(base_dir, self.worktree_prefix.clone())
    }
}

fn anchor(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}
