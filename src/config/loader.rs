// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.
//!
//! Handles loading configuration from JSON and YAML files in various locations.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::WardenConfig;

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[
    ".warden.json",
    ".warden.yaml",
    ".warden.yml",
    ".warden/config.json",
    ".warden/config.yaml",
    ".warden/config.yml",
    "warden.config.json",
    "warden.config.yaml",
    "warden.config.yml",
];

/// Local config file name (for personal overrides).
pub const LOCAL_CONFIG_FILE: &str = ".warden.local.json";

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".warden";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

/// Get the global config directory path.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR))
}

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Load global configuration from ~/.warden/config.json.
pub fn load_global_config() -> Result<Option<WardenConfig>, ConfigError> {
    let path = match get_global_config_path() {
        Some(p) => p,
        None => return Ok(None),
    };

    if !path.exists() {
        return Ok(None);
    }

    load_config_file(&path).map(Some)
}

/// Load repository configuration, using the first of [`CONFIG_FILES`] found.
pub fn load_workspace_config(repo_root: &Path) -> Result<Option<WardenConfig>, ConfigError> {
    for filename in CONFIG_FILES {
        let path = repo_root.join(filename);
        if path.is_file() {
            return load_config_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load local configuration from .warden.local.json.
pub fn load_local_config(repo_root: &Path) -> Result<Option<WardenConfig>, ConfigError> {
    let path = repo_root.join(LOCAL_CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Load a configuration file (JSON or YAML).
pub fn load_config_file(path: &Path) -> Result<WardenConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        _ => serde_json::from_str(&content).map_err(ConfigError::from),
    }
}

/// Write a starter config file to `.warden.json`.
pub fn init_config(repo_root: &Path, config: Option<WardenConfig>) -> Result<PathBuf, ConfigError> {
    let config = config.unwrap_or_else(get_example_config);
    let path = repo_root.join(CONFIG_FILES[0]);
    if path.exists() {
        return Err(ConfigError::InvalidValue {
            field: "path".to_string(),
            message: format!("{} already exists", path.display()),
        });
    }

    let content = serde_json::to_string_pretty(&config)?;
    std::fs::write(&path, content)?;

    Ok(path)
}

/// Example configuration written by [`init_config`].
pub fn get_example_config() -> WardenConfig {
    WardenConfig {
        base_branch: Some("main".to_string()),
        default_denied_paths: Some(vec!["**/.env".to_string(), ".git/**".to_string()]),
        ..Default::default()
    }
}
