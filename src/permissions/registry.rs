// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session → capability registry.
//!
//! The registry is an ordinary value owned by the coordinating process and
//! handed to the interceptor; there is no process-wide instance. Records live
//! only in memory and disappear with the registry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::capability::{AllowedPaths, BoundWorkspace, CapabilityRecord, Decision, DenyReason};
use super::glob::GlobPattern;
use super::role::Role;
use crate::config::RoleOverride;

/// Policy applied to every registration.
#[derive(Debug, Clone, Default)]
pub struct RegistryPolicy {
    /// Deny actions from unregistered sessions instead of allowing them.
    pub strict_mode: bool,
    /// Patterns appended to every record's denied set.
    pub default_denied_paths: Vec<String>,
    /// Per-role adjustments layered over the built-in role defaults.
    pub role_overrides: HashMap<Role, RoleOverride>,
}

/// Arguments to [`PermissionRegistry::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub session_id: String,
    pub role: Role,
    pub can_mutate: Option<bool>,
    pub allowed_paths: Option<Vec<String>>,
    pub denied_paths: Vec<String>,
    pub bound_workspace: Option<BoundWorkspace>,
}

impl Registration {
    pub fn new(session_id: impl Into<String>, role: Role) -> Self {
        Self {
            session_id: session_id.into(),
            role,
            can_mutate: None,
            allowed_paths: None,
            denied_paths: Vec::new(),
            bound_workspace: None,
        }
    }

    /// Override the role's default mutability.
    pub fn with_can_mutate(mut self, can_mutate: bool) -> Self {
        self.can_mutate = Some(can_mutate);
        self
    }

    /// Restrict writes to these patterns.
    pub fn with_allowed_paths<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_paths = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Forbid writes to these patterns.
    pub fn with_denied_paths<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied_paths = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Bind the session to a workspace.
    pub fn bound_to(mut self, workspace: BoundWorkspace) -> Self {
        self.bound_workspace = Some(workspace);
        self
    }
}

/// Registry of capability records keyed by session id.
#[derive(Debug, Clone, Default)]
pub struct PermissionRegistry {
    records: Arc<RwLock<HashMap<String, CapabilityRecord>>>,
    policy: RegistryPolicy,
}

impl PermissionRegistry {
    /// Create an empty registry with the default (fail-open) policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with a policy.
    pub fn with_policy(policy: RegistryPolicy) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            policy,
        }
    }

    pub fn policy(&self) -> &RegistryPolicy {
        &self.policy
    }

    pub fn is_strict(&self) -> bool {
        self.policy.strict_mode
    }

    /// Register (or replace) a session's capability record.
    ///
    /// Precedence for each field: explicit registration value, then the
    /// configured role override, then the role default. Denied patterns are
    /// unioned across all three plus the policy-wide defaults.
    pub async fn register(&self, registration: Registration) -> CapabilityRecord {
        let role_override = self.policy.role_overrides.get(&registration.role);

        let can_mutate = registration
            .can_mutate
            .or_else(|| role_override.and_then(|o| o.can_mutate))
            .unwrap_or_else(|| registration.role.default_can_mutate());

        let allowed_paths = match registration
            .allowed_paths
            .or_else(|| role_override.and_then(|o| o.allowed_paths.clone()))
        {
            Some(patterns) => AllowedPaths::only(patterns),
            None => AllowedPaths::Unrestricted,
        };

        let mut denied: Vec<String> = Vec::new();
        let sources = registration
            .denied_paths
            .iter()
            .chain(role_override.and_then(|o| o.denied_paths.as_ref()).into_iter().flatten())
            .chain(self.policy.default_denied_paths.iter());
        for pattern in sources {
            if !denied.contains(pattern) {
                denied.push(pattern.clone());
            }
        }

        let record = CapabilityRecord {
            session_id: registration.session_id.clone(),
            role: registration.role,
            can_mutate,
            allowed_paths,
            denied_paths: denied.into_iter().map(GlobPattern::new).collect(),
            bound_workspace: registration.bound_workspace,
        };

        let mut records = self.records.write().await;

        if let Some(ws) = &record.bound_workspace {
            let sharing: Vec<&str> = records
                .values()
                .filter(|r| r.session_id != record.session_id)
                .filter(|r| r.bound_workspace.as_ref().map(|b| &b.name) == Some(&ws.name))
                .map(|r| r.session_id.as_str())
                .collect();
            if !sharing.is_empty() {
                warn!(
                    workspace = %ws.name,
                    others = ?sharing,
                    "Workspace is already bound to other sessions"
                );
            }
        }

        if records
            .insert(record.session_id.clone(), record.clone())
            .is_some()
        {
            debug!(session = %record.session_id, "Replaced existing capability record");
        }

        info!(
            session = %record.session_id,
            role = %record.role,
            can_mutate = record.can_mutate,
            workspace = record.bound_workspace.as_ref().map(|w| w.name.as_str()).unwrap_or("-"),
            "Registered session"
        );

        record
    }

    /// Remove a session's record, returning it if it existed.
    pub async fn unregister(&self, session_id: &str) -> Option<CapabilityRecord> {
        let removed = self.records.write().await.remove(session_id);
        if removed.is_some() {
            info!(session = %session_id, "Unregistered session");
        }
        removed
    }

    /// Look up a session's record.
    pub async fn get(&self, session_id: &str) -> Option<CapabilityRecord> {
        self.records.read().await.get(session_id).cloned()
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Sessions currently bound to the named workspace.
    pub async fn sessions_bound_to(&self, workspace: &str) -> Vec<String> {
        let records = self.records.read().await;
        let mut sessions: Vec<String> = records
            .values()
            .filter(|r| r.bound_workspace.as_ref().is_some_and(|w| w.name == workspace))
            .map(|r| r.session_id.clone())
            .collect();
        sessions.sort();
        sessions
    }

    /// Authorize a file mutation at `path` for a session.
    pub async fn authorize_write(&self, session_id: &str, path: &str) -> Decision {
        match self.get(session_id).await {
            Some(record) => record.check_write(path),
            None => self.unknown_session(session_id),
        }
    }

    /// Decision for a session with no record.
    pub(crate) fn unknown_session(&self, session_id: &str) -> Decision {
        if self.policy.strict_mode {
            Decision::Deny(DenyReason::UnknownSession {
                session_id: session_id.to_string(),
            })
        } else {
            debug!(session = %session_id, "No capability record, allowing");
            Decision::Allow
        }
    }
}
