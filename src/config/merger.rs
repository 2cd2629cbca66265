// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles merging configurations from different sources with proper precedence.

use std::path::PathBuf;

use tracing::warn;

use super::types::{ResolvedConfig, WardenConfig};
use crate::permissions::Role;

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub base_branch: Option<String>,
    pub worktree_dir: Option<PathBuf>,
    pub strict_mode: Option<bool>,
    pub test_command: Option<String>,
}

/// Default configuration values.
pub fn default_config() -> ResolvedConfig {
    ResolvedConfig::default()
}

/// Merge multiple configurations with precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Local config (.warden.local.json)
/// 3. Repository config (.warden.json and friends)
/// 4. Global config (~/.warden/config.json)
/// 5. Default values
///
/// Scalars are replaced by the higher layer. Pattern lists accumulate
/// without duplicates. Role overrides merge field by field.
pub fn merge_config(
    global: Option<WardenConfig>,
    workspace: Option<WardenConfig>,
    local: Option<WardenConfig>,
    cli: CliOptions,
) -> ResolvedConfig {
    let mut result = default_config();

    for config in [global, workspace, local].into_iter().flatten() {
        apply_warden_config(&mut result, &config);
    }

    apply_cli_options(&mut result, &cli);

    result
}

fn apply_warden_config(result: &mut ResolvedConfig, config: &WardenConfig) {
    if let Some(strict) = config.strict_mode {
        result.strict_mode = strict;
    }

    if config.base_branch.is_some() {
        result.base_branch = config.base_branch.clone();
    }

    if config.worktree_dir.is_some() {
        result.worktree_dir = config.worktree_dir.clone();
    }

    if let Some(ref prefix) = config.worktree_prefix {
        result.worktree_prefix = prefix.clone();
    }

    if config.event_log.is_some() {
        result.event_log = config.event_log.clone();
    }

    if let Some(enabled) = config.event_log_enabled {
        result.event_log_enabled = enabled;
    }

    if let Some(ref patterns) = config.dangerous_patterns {
        extend_unique(&mut result.dangerous_patterns, patterns);
    }

    if let Some(ref patterns) = config.default_denied_paths {
        extend_unique(&mut result.default_denied_paths, patterns);
    }

    if let Some(ref roles) = config.roles {
        for (name, incoming) in roles {
            let role: Role = match name.parse() {
                Ok(role) => role,
                Err(e) => {
                    warn!("Ignoring role override: {}", e);
                    continue;
                }
            };
            let entry = result.roles.entry(role).or_default();
            if incoming.can_mutate.is_some() {
                entry.can_mutate = incoming.can_mutate;
            }
            if incoming.allowed_paths.is_some() {
                entry.allowed_paths = incoming.allowed_paths.clone();
            }
            if let Some(ref denied) = incoming.denied_paths {
                extend_unique(entry.denied_paths.get_or_insert_with(Vec::new), denied);
            }
        }
    }

    if config.test_command.is_some() {
        result.test_command = config.test_command.clone();
    }

    if let Some(timeout) = config.test_timeout_ms {
        result.test_timeout_ms = timeout;
    }
}

fn apply_cli_options(result: &mut ResolvedConfig, cli: &CliOptions) {
    if cli.base_branch.is_some() {
        result.base_branch = cli.base_branch.clone();
    }

    if cli.worktree_dir.is_some() {
        result.worktree_dir = cli.worktree_dir.clone();
    }

    if let Some(strict) = cli.strict_mode {
        result.strict_mode = strict;
    }

    if cli.test_command.is_some() {
        result.test_command = cli.test_command.clone();
    }
}

fn extend_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
