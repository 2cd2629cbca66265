// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The choke point every agent action passes through.

use tracing::{debug, warn};

use super::action::Action;
use super::denylist::CommandDenylist;
use crate::events::EventLog;
use crate::permissions::{CapabilityRecord, Decision, DenyReason, PermissionRegistry};

/// Result of intercepting an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Execute this (possibly rewritten) action.
    Allowed(Action),
    /// Do not execute anything.
    Denied(DenyReason),
}

impl Interception {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    pub fn into_decision(self) -> Decision {
        match self {
            Self::Allowed(_) => Decision::Allow,
            Self::Denied(reason) => Decision::Deny(reason),
        }
    }
}

/// Authorizes and rewrites agent actions.
#[derive(Debug, Clone)]
pub struct ActionInterceptor {
    registry: PermissionRegistry,
    denylist: CommandDenylist,
    events: EventLog,
}

impl ActionInterceptor {
    pub fn new(registry: PermissionRegistry) -> Self {
        Self {
            registry,
            denylist: CommandDenylist::default(),
            events: EventLog::disabled(),
        }
    }

    pub fn with_denylist(mut self, denylist: CommandDenylist) -> Self {
        self.denylist = denylist;
        self
    }

    pub fn with_event_log(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    pub fn registry(&self) -> &PermissionRegistry {
        &self.registry
    }

    /// Decide whether a session may perform an action, without rewriting it.
    pub async fn authorize(&self, session_id: &str, action: &Action) -> Decision {
        self.intercept(session_id, action.clone()).await.into_decision()
    }

    /// Authorize an action and return the form that should actually run.
    ///
    /// For sessions bound to a workspace, relative file paths are resolved
    /// against the workspace root before the ownership check, and shell
    /// commands are prefixed with a `cd` into the root.
    pub async fn intercept(&self, session_id: &str, action: Action) -> Interception {
        if !action.is_mutating() {
            return Interception::Allowed(action);
        }

        let Some(record) = self.registry.get(session_id).await else {
            return match self.registry.unknown_session(session_id) {
                Decision::Allow => Interception::Allowed(action),
                Decision::Deny(reason) => self.deny(session_id, &action, reason),
            };
        };

        let rooted = match &record.bound_workspace {
            Some(ws) => action.clone().rooted_in(&ws.root),
            None => action.clone(),
        };

        // File paths are checked resolved, shell commands as issued.
        let checked = match &action {
            Action::Shell { .. } => &action,
            _ => &rooted,
        };

        match evaluate(&record, checked, &self.denylist) {
            Decision::Allow => {
                debug!(session = %session_id, action = ?rooted, "Action allowed");
                Interception::Allowed(rooted)
            }
            Decision::Deny(reason) => self.deny(session_id, checked, reason),
        }
    }

    /// Intercept an engine tool call, rewriting `input` in place when allowed.
    ///
    /// A mutating tool whose input cannot be parsed is denied.
    pub async fn intercept_tool_call(
        &self,
        session_id: &str,
        tool_name: &str,
        input: &mut serde_json::Value,
    ) -> Decision {
        let action = match Action::from_tool_call(tool_name, input) {
            Ok(action) => action,
            Err(e) => {
                let reason = DenyReason::MalformedAction {
                    tool: tool_name.to_string(),
                    detail: e.to_string(),
                };
                warn!(session = %session_id, tool = %tool_name, "{}", reason);
                self.events.warn(
                    "action denied",
                    serde_json::json!({
                        "session": session_id,
                        "tool": tool_name,
                        "reason": reason.to_string(),
                    }),
                );
                return Decision::Deny(reason);
            }
        };

        match self.intercept(session_id, action).await {
            Interception::Allowed(action) => {
                action.apply_to_input(input);
                Decision::Allow
            }
            Interception::Denied(reason) => Decision::Deny(reason),
        }
    }

    fn deny(&self, session_id: &str, action: &Action, reason: DenyReason) -> Interception {
        warn!(session = %session_id, "Action denied: {}", reason);
        self.events.warn(
            "action denied",
            serde_json::json!({
                "session": session_id,
                "action": action,
                "reason": reason.to_string(),
            }),
        );
        Interception::Denied(reason)
    }
}

fn evaluate(record: &CapabilityRecord, action: &Action, denylist: &CommandDenylist) -> Decision {
    match action {
        Action::Read { .. } => Decision::Allow,
        Action::File { path, .. } => record.check_write(path),
        Action::Shell { command } => {
            if record.can_mutate {
                return Decision::Allow;
            }
            match denylist.check(command) {
                Some(hit) => Decision::Deny(DenyReason::CommandDenied {
                    rule: hit.rule,
                    matched: hit.matched,
                }),
                None => Decision::Allow,
            }
        }
    }
}
