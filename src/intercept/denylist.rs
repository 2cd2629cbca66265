// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Mutation tripwire for shell commands issued by read-only sessions.
//!
//! This is a textual filter, not a sandbox. It catches the obvious ways a
//! command writes to disk (redirection, rm/mv/cp, mkdir, package installs,
//! git commits and pushes) and nothing cleverer: `python -c "open(...)"`,
//! variable indirection or base64-piped scripts all pass straight through.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Redirections that never write a file: fd duplication, fd close, and
/// writes to the null/stdio devices. Removed before rules run.
static BENIGN_REDIRECTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\d*>&(?:\d+|-)|&>>?\s*/dev/null|\d*>>?\s*/dev/(?:null|stdout|stderr))(?P<end>\s|$|[;&|)])",
    )
    .expect("benign redirect regex")
});

/// Command-position prefix: start of text, whitespace or a shell operator.
const CMD: &str = r"(?:^|[\s;&|(`])";

static BUILTIN_RULES: Lazy<Vec<DenyRule>> = Lazy::new(|| {
    let rules: [(&str, String); 8] = [
        (
            "redirection write",
            r"(?:^|[^-=<>])(?:>\||>&|>>?)\s*[^\s>&|=]".to_string(),
        ),
        (
            "file deletion",
            format!(r"{CMD}(?:rm|rmdir|unlink|shred)\s|\bfind\b.*\s-delete\b"),
        ),
        ("file move", format!(r"{CMD}mv\s")),
        ("file copy", format!(r"{CMD}(?:cp|rsync)\s")),
        ("directory creation", format!(r"{CMD}mkdir\s")),
        (
            "file write",
            format!(r"{CMD}(?:tee|touch|truncate)\s|\bsed\s+(?:-[a-zA-Z]*i|--in-place)"),
        ),
        (
            "package installation",
            r"\b(?:npm|pnpm|bun)\s+(?:install|i|add|ci)\b|\byarn\s+(?:add|install)\b|\bpip3?\s+install\b|\bcargo\s+(?:install|add)\b|\b(?:apt|apt-get|brew|dnf|yum|apk)\s+(?:install|add)\b|\bgo\s+(?:get|install)\b|\bgem\s+install\b|\b(?:poetry|uv)\s+add\b".to_string(),
        ),
        (
            "version-control mutation",
            r"\bgit(?:\s+-[Cc]\s+\S+)*\s+(?:commit|push|merge|rebase|reset|cherry-pick|add|rm|mv|stash)\b".to_string(),
        ),
    ];

    rules
        .into_iter()
        .map(|(name, pattern)| DenyRule {
            name: name.to_string(),
            regex: Regex::new(&pattern).expect("builtin deny rule"),
        })
        .collect()
});

/// One named tripwire.
#[derive(Debug, Clone)]
pub struct DenyRule {
    pub name: String,
    pub regex: Regex,
}

/// A rule that fired, with the offending fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMatch {
    pub rule: String,
    pub matched: String,
}

/// Ordered set of tripwires applied to read-only shell commands.
#[derive(Debug, Clone)]
pub struct CommandDenylist {
    rules: Vec<DenyRule>,
}

impl Default for CommandDenylist {
    fn default() -> Self {
        Self {
            rules: BUILTIN_RULES.clone(),
        }
    }
}

impl CommandDenylist {
    /// Built-in rules only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in rules plus extra regex patterns.
    ///
    /// Invalid patterns are skipped with a warning.
    pub fn with_extra_patterns(mut self, patterns: &[String]) -> Self {
        for pattern in patterns {
            match Regex::new(pattern) {
                Ok(regex) => self.rules.push(DenyRule {
                    name: format!("custom pattern /{pattern}/"),
                    regex,
                }),
                Err(e) => warn!("Invalid dangerous pattern '{}': {}", pattern, e),
            }
        }
        self
    }

    /// Number of active rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Return the first rule the command trips, if any.
    pub fn check(&self, command: &str) -> Option<CommandMatch> {
        let scrubbed = BENIGN_REDIRECTS.replace_all(command, " $end");
        self.rules.iter().find_map(|rule| {
            rule.regex.find(&scrubbed).map(|m| CommandMatch {
                rule: rule.name.clone(),
                matched: m.as_str().trim().to_string(),
            })
        })
    }
}
