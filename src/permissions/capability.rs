// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Capability records and authorization decisions.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::glob::{normalize_path, GlobPattern};
use super::role::Role;

/// Paths a session is allowed to mutate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedPaths {
    /// No ownership restriction.
    Unrestricted,
    /// Only paths matching one of these patterns.
    ///
    /// An empty list places no restriction; use a read-only record to forbid
    /// all writes.
    Only(Vec<GlobPattern>),
}

impl AllowedPaths {
    /// Build a scope from pattern strings.
    pub fn only<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(patterns.into_iter().map(|p| GlobPattern::new(p)).collect())
    }

    /// Whether this scope actually restricts anything.
    pub fn is_restricting(&self) -> bool {
        matches!(self, Self::Only(patterns) if !patterns.is_empty())
    }

    /// The patterns as strings (empty for unrestricted).
    pub fn patterns(&self) -> Vec<String> {
        match self {
            Self::Unrestricted => Vec::new(),
            Self::Only(patterns) => patterns.iter().map(|p| p.as_str().to_string()).collect(),
        }
    }
}

/// Workspace a session is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundWorkspace {
    /// Workspace (branch) name.
    pub name: String,
    /// Root directory of the workspace.
    pub root: PathBuf,
}

impl BoundWorkspace {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Express `path` relative to the workspace root, if it lies inside it.
    pub fn relative(&self, path: &str) -> Option<String> {
        let root = normalize_path(&self.root.to_string_lossy());
        let path = normalize_path(path);
        if path == root {
            return Some(String::new());
        }
        path.strip_prefix(&root)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(str::to_string)
    }

    /// Resolve a possibly relative path against the workspace root.
    pub fn resolve(&self, path: &str) -> String {
        if Path::new(path).is_absolute() || path.starts_with('/') {
            path.to_string()
        } else {
            self.root.join(path).to_string_lossy().into_owned()
        }
    }
}

/// The authorization profile attached to one agent session.
#[derive(Debug, Clone)]
pub struct CapabilityRecord {
    pub session_id: String,
    pub role: Role,
    pub can_mutate: bool,
    pub allowed_paths: AllowedPaths,
    pub denied_paths: Vec<GlobPattern>,
    pub bound_workspace: Option<BoundWorkspace>,
}

impl CapabilityRecord {
    /// Create a record with the role's default mutability and no path limits.
    pub fn new(session_id: impl Into<String>, role: Role) -> Self {
        Self {
            session_id: session_id.into(),
            role,
            can_mutate: role.default_can_mutate(),
            allowed_paths: AllowedPaths::Unrestricted,
            denied_paths: Vec::new(),
            bound_workspace: None,
        }
    }

    /// Check whether this session may mutate the file at `path`.
    ///
    /// Order: mutability, then denied patterns, then allowed patterns.
    /// For bound sessions a path inside the workspace is also tried in its
    /// workspace-relative form.
    pub fn check_write(&self, path: &str) -> Decision {
        if !self.can_mutate {
            return Decision::Deny(DenyReason::ReadOnlyRole { role: self.role });
        }

        let candidates = self.candidates(path);

        for pattern in &self.denied_paths {
            if candidates.iter().any(|c| pattern.matches(c)) {
                return Decision::Deny(DenyReason::PathDenied {
                    path: path.to_string(),
                    pattern: pattern.as_str().to_string(),
                });
            }
        }

        if let AllowedPaths::Only(patterns) = &self.allowed_paths {
            if !patterns.is_empty()
                && !patterns
                    .iter()
                    .any(|pattern| candidates.iter().any(|c| pattern.matches(c)))
            {
                return Decision::Deny(DenyReason::OutsideOwnership {
                    path: path.to_string(),
                    allowed: self.allowed_paths.patterns(),
                });
            }
        }

        Decision::Allow
    }

    fn candidates(&self, path: &str) -> Vec<String> {
        let mut candidates = vec![normalize_path(path)];
        if let Some(relative) = self
            .bound_workspace
            .as_ref()
            .and_then(|ws| ws.relative(path))
        {
            if !relative.is_empty() {
                candidates.push(relative);
            }
        }
        candidates
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    /// The denial reason, if any.
    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(reason),
        }
    }
}

/// Why an action was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenyReason {
    /// Session is not registered and strict mode is on.
    UnknownSession { session_id: String },
    /// The session's role cannot mutate anything.
    ReadOnlyRole { role: Role },
    /// Target matches a denied pattern.
    PathDenied { path: String, pattern: String },
    /// Target matches none of the allowed patterns.
    OutsideOwnership { path: String, allowed: Vec<String> },
    /// Shell command matched a mutation tripwire.
    CommandDenied { rule: String, matched: String },
    /// A mutating tool call could not be understood.
    MalformedAction { tool: String, detail: String },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSession { session_id } => {
                write!(f, "unknown session '{session_id}' (strict mode)")
            }
            Self::ReadOnlyRole { role } => write!(f, "role is read-only ({role})"),
            Self::PathDenied { path, pattern } => {
                write!(f, "path explicitly denied: {path} matches '{pattern}'")
            }
            Self::OutsideOwnership { path, allowed } => write!(
                f,
                "path outside ownership: {path} matches none of [{}]",
                allowed.join(", ")
            ),
            Self::CommandDenied { rule, matched } => {
                write!(f, "command denied for read-only role: {rule} ('{matched}')")
            }
            Self::MalformedAction { tool, detail } => {
                write!(f, "malformed {tool} call: {detail}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn implementer(allowed: &[&str]) -> CapabilityRecord {
        let mut record = CapabilityRecord::new("s1", Role::Implementer);
        record.allowed_paths = AllowedPaths::only(allowed.iter().copied());
        record
    }

    #[test]
    fn test_read_only_denies_every_path() {
        let record = CapabilityRecord::new("r1", Role::Reviewer);
        for path in ["/a", "src/lib.rs", "/backend/server.js", ""] {
            assert_eq!(
                record.check_write(path),
                Decision::Deny(DenyReason::ReadOnlyRole { role: Role::Reviewer })
            );
        }
    }

    #[test]
    fn test_ownership_scope() {
        let record = implementer(&["/backend/**"]);
        assert!(record.check_write("/backend/server.js").is_allowed());

        let decision = record.check_write("/frontend/app.js");
        assert!(matches!(
            decision,
            Decision::Deny(DenyReason::OutsideOwnership { ref path, .. }) if path == "/frontend/app.js"
        ));
    }

    #[test]
    fn test_deny_wins_over_allow() {
        let mut record = implementer(&["/backend/**"]);
        record.denied_paths = vec![GlobPattern::new("/backend/secrets/**")];

        let decision = record.check_write("/backend/secrets/key.pem");
        assert_eq!(
            decision,
            Decision::Deny(DenyReason::PathDenied {
                path: "/backend/secrets/key.pem".to_string(),
                pattern: "/backend/secrets/**".to_string(),
            })
        );
    }

    #[test]
    fn test_unrestricted_allows_anything_not_denied() {
        let mut record = CapabilityRecord::new("c1", Role::Coordinator);
        record.denied_paths = vec![GlobPattern::new("**/.env")];

        assert!(record.check_write("/anything/at/all.rs").is_allowed());
        assert!(record.check_write("relative.txt").is_allowed());
        assert!(record.check_write("/app/.env").is_denied());
    }

    #[test]
    fn test_empty_allowed_list_is_not_restricting() {
        let record = implementer(&[]);
        assert!(!record.allowed_paths.is_restricting());
        assert!(record.check_write("/x/y.rs").is_allowed());
    }

    #[test]
    fn test_workspace_relative_candidates() {
        let mut record = implementer(&["src/**"]);
        record.bound_workspace = Some(BoundWorkspace::new("feat/a", "/work/warden-feat-a"));

        assert!(record.check_write("/work/warden-feat-a/src/lib.rs").is_allowed());
        assert!(record.check_write("/work/warden-feat-a/docs/x.md").is_denied());
        assert!(record.check_write("/elsewhere/src/lib.rs").is_denied());
    }

    #[test]
    fn test_bound_workspace_relative_and_resolve() {
        let ws = BoundWorkspace::new("w", "/work/w");
        assert_eq!(ws.relative("/work/w/a/b.rs"), Some("a/b.rs".to_string()));
        assert_eq!(ws.relative("/work/w"), Some(String::new()));
        assert_eq!(ws.relative("/work/wx/a.rs"), None);
        assert_eq!(ws.resolve("src/a.rs"), "/work/w/src/a.rs");
        assert_eq!(ws.resolve("/abs/a.rs"), "/abs/a.rs");
    }

    #[test]
    fn test_deny_reason_messages_name_the_path() {
        let reason = DenyReason::OutsideOwnership {
            path: "/frontend/app.js".to_string(),
            allowed: vec!["/backend/**".to_string()],
        };
        let message = reason.to_string();
        assert!(message.contains("/frontend/app.js"));
        assert!(message.contains("/backend/**"));

        let reason = DenyReason::ReadOnlyRole { role: Role::Planner };
        assert_eq!(reason.to_string(), "role is read-only (planner)");
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_value(Decision::Allow).unwrap();
        assert_eq!(json["decision"], "allow");

        let json = serde_json::to_value(Decision::Deny(DenyReason::ReadOnlyRole {
            role: Role::Analyst,
        }))
        .unwrap();
        assert_eq!(json["decision"], "deny");
    }
}
