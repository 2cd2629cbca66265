// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for warden.
//!
//! Handles loading and merging of configuration from multiple sources:
//! - Global config: ~/.warden/config.json
//! - Repository config: .warden.json, .warden/config.json, or warden.config.json
//!   (each also accepted as .yaml / .yml)
//! - Local config: .warden.local.json (gitignored, for personal overrides)
//! - CLI options: command-line arguments
//!
//! Configuration is merged with precedence (CLI > local > repository > global > defaults).

mod loader;
mod merger;
mod types;

pub use loader::{
    get_example_config, get_global_config_dir, get_global_config_path, init_config,
    load_config_file, load_global_config, load_local_config, load_workspace_config, CONFIG_FILES,
    GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILE, LOCAL_CONFIG_FILE,
};

pub use merger::{default_config, merge_config, CliOptions};

pub use types::{
    ResolvedConfig, RoleOverride, WardenConfig, DEFAULT_EVENT_LOG, DEFAULT_TEST_TIMEOUT_MS,
    DEFAULT_WORKTREE_PREFIX,
};

use crate::error::ConfigError;
use std::path::Path;

/// Load and merge all configuration sources for a repository.
pub fn load_config(repo_root: &Path, cli_options: CliOptions) -> Result<ResolvedConfig, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(repo_root)?;
    let local = load_local_config(repo_root)?;

    Ok(merge_config(global, workspace, local, cli_options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_with_no_files() {
        let temp = TempDir::new().unwrap();
        let result = load_config(temp.path(), CliOptions::default());
        // A global config may exist on the machine running the tests
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_config_with_workspace_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".warden.json"),
            r#"{"baseBranch": "develop", "worktreePrefix": "agent-"}"#,
        )
        .unwrap();

        let config = load_config(temp.path(), CliOptions::default()).unwrap();
        assert_eq!(config.base_branch, Some("develop".to_string()));
        assert_eq!(config.worktree_prefix, "agent-");
    }

    #[test]
    fn test_load_config_local_and_cli_override() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".warden.json"), r#"{"baseBranch": "develop"}"#).unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_FILE), r#"{"strictMode": true}"#).unwrap();

        let cli = CliOptions {
            base_branch: Some("main".to_string()),
            ..Default::default()
        };

        let config = load_config(temp.path(), cli).unwrap();
        assert_eq!(config.base_branch, Some("main".to_string()));
        assert!(config.strict_mode);
    }
}
