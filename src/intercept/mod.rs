// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Action interception.
//!
//! The agent engine hands every tool call to an [`ActionInterceptor`] before
//! executing it. The interceptor maps the call onto an [`Action`], looks up
//! the session's capability record and either returns the action to run
//! (rooted in the session's workspace when it has one) or a denial reason.
//!
//! A denied action is never executed; the reason goes back to the agent as
//! the tool result.

pub mod action;
pub mod denylist;
pub mod interceptor;

pub use action::{Action, ActionError, FileOp, FILE_MUTATING_TOOLS, SHELL_TOOLS};
pub use denylist::{CommandDenylist, CommandMatch, DenyRule};
pub use interceptor::{ActionInterceptor, Interception};
