// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The role an agent session plays in a swarm.
///
/// A role determines whether the session may mutate the tree by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Coordinator,
    Analyst,
    Planner,
    Implementer,
    Tester,
    Reviewer,
    SecurityAuditor,
    Fixer,
    ConflictResolver,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 9] = [
        Role::Coordinator,
        Role::Analyst,
        Role::Planner,
        Role::Implementer,
        Role::Tester,
        Role::Reviewer,
        Role::SecurityAuditor,
        Role::Fixer,
        Role::ConflictResolver,
    ];

    /// Whether sessions with this role may mutate files by default.
    pub fn default_can_mutate(self) -> bool {
        !matches!(
            self,
            Role::Analyst | Role::Planner | Role::Reviewer | Role::SecurityAuditor
        )
    }

    /// Kebab-case name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Coordinator => "coordinator",
            Role::Analyst => "analyst",
            Role::Planner => "planner",
            Role::Implementer => "implementer",
            Role::Tester => "tester",
            Role::Reviewer => "reviewer",
            Role::SecurityAuditor => "security-auditor",
            Role::Fixer => "fixer",
            Role::ConflictResolver => "conflict-resolver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_roles() {
        assert!(!Role::Analyst.default_can_mutate());
        assert!(!Role::Planner.default_can_mutate());
        assert!(!Role::Reviewer.default_can_mutate());
        assert!(!Role::SecurityAuditor.default_can_mutate());
    }

    #[test]
    fn test_mutating_roles() {
        assert!(Role::Coordinator.default_can_mutate());
        assert!(Role::Implementer.default_can_mutate());
        assert!(Role::Tester.default_can_mutate());
        assert!(Role::Fixer.default_can_mutate());
        assert!(Role::ConflictResolver.default_can_mutate());
    }

    #[test]
    fn test_parse_role() {
        assert_eq!("implementer".parse::<Role>().unwrap(), Role::Implementer);
        assert_eq!("Security-Auditor".parse::<Role>().unwrap(), Role::SecurityAuditor);
        assert_eq!("conflict_resolver".parse::<Role>().unwrap(), Role::ConflictResolver);
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_names() {
        let json = serde_json::to_string(&Role::SecurityAuditor).unwrap();
        assert_eq!(json, "\"security-auditor\"");

        for role in Role::ALL {
            let parsed: Role = serde_json::from_str(&format!("\"{}\"", role)).unwrap();
            assert_eq!(parsed, role);
        }
    }
}
