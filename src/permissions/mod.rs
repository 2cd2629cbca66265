// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Capability model for agent sessions.
//!
//! Every agent session is described by a [`CapabilityRecord`]: its [`Role`],
//! whether it may mutate the tree at all, which paths it owns and which paths
//! it must never touch. Records are held by a [`PermissionRegistry`] that the
//! coordinator passes to the action interceptor.
//!
//! # Write authorization
//!
//! ```text
//! record?          ── none ──► Allow (or Deny in strict mode)
//! can_mutate?      ── no ────► Deny: role is read-only
//! denied_paths?    ── hit ───► Deny: path explicitly denied
//! allowed_paths?   ── miss ──► Deny: path outside ownership
//!                  └────────► Allow
//! ```

pub mod capability;
pub mod glob;
pub mod registry;
pub mod role;

pub use capability::{AllowedPaths, BoundWorkspace, CapabilityRecord, Decision, DenyReason};
pub use glob::{matches, normalize_path, GlobPattern};
pub use registry::{PermissionRegistry, Registration, RegistryPolicy};
pub use role::{Role, UnknownRole};
