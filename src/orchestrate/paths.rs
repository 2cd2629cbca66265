// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Where workspace checkouts live on disk.
//!
//! ```text
//! /src/project/                 # main checkout (repository root)
//! /src/warden-feat+auth/        # workspace for branch feat/auth
//! /src/warden-fix+bug-12/       # workspace for branch fix/bug-12
//! /src/warden-fix-bug-12/       # workspace for branch fix-bug-12
//! ```
//!
//! The branch-to-directory mapping is reversible, so two branches never share
//! a directory.

use std::path::{Path, PathBuf};

/// Directory and naming scheme for workspace checkouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    /// Directory that holds every workspace.
    pub base_dir: PathBuf,
    /// Prepended to each encoded branch name.
    pub prefix: String,
}

impl WorkspaceLayout {
    pub fn new(base_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Root directory for the workspace of `branch`.
    pub fn path_for(&self, branch: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}{}", self.prefix, encode_branch_name(branch)))
    }

    /// Whether a directory name looks like one of ours.
    pub fn owns_dir_name(&self, name: &str) -> bool {
        name.len() > self.prefix.len() && name.starts_with(&self.prefix)
    }

    /// Branch whose workspace lives in the directory `name`, if any.
    pub fn branch_for(&self, name: &str) -> Option<String> {
        if !self.owns_dir_name(name) {
            return None;
        }
        decode_branch_name(&name[self.prefix.len()..])
    }
}

/// Characters escaped as `%XX` in directory names.
const ESCAPED: &[char] = &['%', '+', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Encode a branch name as a single directory name.
///
/// `/` becomes `+`; `%`, `+` and characters some filesystems reject are
/// escaped as `%XX`. Distinct branches always get distinct names.
pub fn encode_branch_name(branch: &str) -> String {
    let mut out = String::with_capacity(branch.len());
    for c in branch.chars() {
        match c {
            '/' => out.push('+'),
            c if ESCAPED.contains(&c) => out.push_str(&format!("%{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`encode_branch_name`]. `None` for names it never produces.
pub fn decode_branch_name(encoded: &str) -> Option<String> {
    let mut out = String::with_capacity(encoded.len());
    let mut chars = encoded.chars();
    while let Some(c) = chars.next() {
        match c {
            '+' => out.push('/'),
            '%' => {
                let hex: String = chars.by_ref().take(2).collect();
                let byte = u8::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == 2)?;
                let decoded = char::from(byte);
                if !ESCAPED.contains(&decoded) {
                    return None;
                }
                out.push(decoded);
            }
            c if ESCAPED.contains(&c) => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

/// Whether `branch` is usable as a workspace name.
///
/// Rejects names that would collide with path traversal or that git itself
/// refuses (a conservative subset of `git check-ref-format`).
pub fn is_valid_branch_name(branch: &str) -> bool {
    !branch.is_empty()
        && !branch.starts_with('-')
        && !branch.starts_with('/')
        && !branch.ends_with('/')
        && !branch.ends_with(".lock")
        && !branch.contains("..")
        && !branch.contains("//")
        && !branch.contains("@{")
        && !branch
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
}

/// Walk up from `start` to the directory containing `.git`.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|ancestor| ancestor.join(".git").exists())
        .map(Path::to_path_buf)
}
