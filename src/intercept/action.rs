// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Actions an agent can attempt, and their mapping from engine tool calls.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tools that write to a single file.
pub const FILE_MUTATING_TOOLS: &[&str] = &["write_file", "edit_file", "insert_line", "patch_file"];

/// Tools that run a shell command.
pub const SHELL_TOOLS: &[&str] = &["bash"];

/// Kind of file mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOp {
    Write,
    Edit,
    Insert,
    Patch,
}

impl FileOp {
    fn from_tool(tool_name: &str) -> Option<Self> {
        match tool_name {
            "write_file" => Some(Self::Write),
            "edit_file" => Some(Self::Edit),
            "insert_line" => Some(Self::Insert),
            "patch_file" => Some(Self::Patch),
            _ => None,
        }
    }
}

/// Something an agent wants to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Create, modify or patch a file.
    File { op: FileOp, path: String },
    /// Run a shell command.
    Shell { command: String },
    /// Any non-mutating tool.
    Read { tool: String },
}

/// Error mapping a tool call to an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("Invalid input for {tool}: {detail}")]
    InvalidInput { tool: String, detail: String },
}

#[derive(Debug, Deserialize)]
struct FileArgs {
    #[serde(alias = "path")]
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct ShellArgs {
    command: String,
}

fn parse<T>(tool_name: &str, input: &serde_json::Value) -> Result<T, ActionError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(input.clone()).map_err(|err| ActionError::InvalidInput {
        tool: tool_name.to_string(),
        detail: err.to_string(),
    })
}

impl Action {
    pub fn write(path: impl Into<String>) -> Self {
        Self::File {
            op: FileOp::Write,
            path: path.into(),
        }
    }

    pub fn shell(command: impl Into<String>) -> Self {
        Self::Shell {
            command: command.into(),
        }
    }

    pub fn read(tool: impl Into<String>) -> Self {
        Self::Read { tool: tool.into() }
    }

    /// Map an engine tool call onto an action.
    pub fn from_tool_call(tool_name: &str, input: &serde_json::Value) -> Result<Self, ActionError> {
        if let Some(op) = FileOp::from_tool(tool_name) {
            let args: FileArgs = parse(tool_name, input)?;
            return Ok(Self::File {
                op,
                path: args.file_path,
            });
        }

        if SHELL_TOOLS.contains(&tool_name) {
            let args: ShellArgs = parse(tool_name, input)?;
            return Ok(Self::Shell {
                command: args.command,
            });
        }

        Ok(Self::Read {
            tool: tool_name.to_string(),
        })
    }

    /// Whether the action may mutate state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Read { .. })
    }

    /// Root the action in a workspace directory.
    ///
    /// Shell commands are prefixed with a `cd` into `root`; relative file
    /// paths are joined onto it. Applying this twice is a no-op.
    pub fn rooted_in(self, root: &Path) -> Self {
        match self {
            Self::Shell { command } => {
                let prefix = cd_prefix(root);
                if command.starts_with(&prefix) {
                    Self::Shell { command }
                } else {
                    Self::Shell {
                        command: format!("{prefix}{command}"),
                    }
                }
            }
            Self::File { op, path } => {
                if Path::new(&path).is_absolute() || path.starts_with('/') {
                    Self::File { op, path }
                } else {
                    Self::File {
                        op,
                        path: root.join(&path).to_string_lossy().into_owned(),
                    }
                }
            }
            read @ Self::Read { .. } => read,
        }
    }

    /// Write this action back into the tool input it came from.
    pub fn apply_to_input(&self, input: &mut serde_json::Value) {
        let Some(obj) = input.as_object_mut() else {
            return;
        };
        match self {
            Self::Shell { command } => {
                obj.insert("command".to_string(), serde_json::Value::String(command.clone()));
            }
            Self::File { path, .. } => {
                let key = if obj.contains_key("file_path") || !obj.contains_key("path") {
                    "file_path"
                } else {
                    "path"
                };
                obj.insert(key.to_string(), serde_json::Value::String(path.clone()));
            }
            Self::Read { .. } => {}
        }
    }
}

fn cd_prefix(root: &Path) -> String {
    let quoted = shell_escape::escape(root.to_string_lossy());
    format!("cd {quoted} && ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_from_tool_call_file_tools() {
        let action = Action::from_tool_call("write_file", &json!({"file_path": "/a.rs", "content": "x"})).unwrap();
        assert_eq!(action, Action::write("/a.rs"));

        let action = Action::from_tool_call("edit_file", &json!({"path": "b.rs"})).unwrap();
        assert_eq!(
            action,
            Action::File {
                op: FileOp::Edit,
                path: "b.rs".to_string()
            }
        );
        assert!(action.is_mutating());
    }

    #[test]
    fn test_every_file_tool_maps_to_file_action() {
        for tool in FILE_MUTATING_TOOLS {
            let action = Action::from_tool_call(tool, &json!({"file_path": "x"})).unwrap();
            assert!(matches!(action, Action::File { .. }), "{tool}");
        }
    }

    #[test]
    fn test_from_tool_call_shell_and_read() {
        let action = Action::from_tool_call("bash", &json!({"command": "ls"})).unwrap();
        assert_eq!(action, Action::shell("ls"));

        let action = Action::from_tool_call("grep", &json!({"pattern": "x"})).unwrap();
        assert_eq!(action, Action::read("grep"));
        assert!(!action.is_mutating());
    }

    #[test]
    fn test_from_tool_call_missing_arguments() {
        let err = Action::from_tool_call("write_file", &json!({"content": "x"})).unwrap_err();
        assert!(matches!(err, ActionError::InvalidInput { ref tool, .. } if tool == "write_file"));
        assert!(Action::from_tool_call("bash", &json!({})).is_err());
    }

    #[test]
    fn test_rooted_shell_command() {
        let root = PathBuf::from("/work/warden-feat-a");
        let rooted = Action::shell("cargo test").rooted_in(&root);
        assert_eq!(rooted, Action::shell("cd /work/warden-feat-a && cargo test"));

        // Idempotent
        let again = rooted.clone().rooted_in(&root);
        assert_eq!(again, rooted);
    }

    #[test]
    fn test_rooted_shell_command_quotes_path() {
        let root = PathBuf::from("/work/my repo");
        let rooted = Action::shell("ls").rooted_in(&root);
        assert_eq!(rooted, Action::shell("cd '/work/my repo' && ls"));
    }

    #[test]
    fn test_rooted_file_paths() {
        let root = PathBuf::from("/work/w");
        assert_eq!(Action::write("src/a.rs").rooted_in(&root), Action::write("/work/w/src/a.rs"));
        assert_eq!(Action::write("/abs/a.rs").rooted_in(&root), Action::write("/abs/a.rs"));
        assert_eq!(Action::read("glob").rooted_in(&root), Action::read("glob"));
    }

    #[test]
    fn test_apply_to_input() {
        let mut input = json!({"command": "ls", "timeout": 100});
        Action::shell("cd /w && ls").apply_to_input(&mut input);
        assert_eq!(input["command"], "cd /w && ls");
        assert_eq!(input["timeout"], 100);

        let mut input = json!({"path": "a.rs"});
        Action::write("/w/a.rs").apply_to_input(&mut input);
        assert_eq!(input["path"], "/w/a.rs");
        assert!(input.get("file_path").is_none());

        let mut input = json!({"file_path": "a.rs"});
        Action::write("/w/a.rs").apply_to_input(&mut input);
        assert_eq!(input["file_path"], "/w/a.rs");
    }
}
