// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Test oracle for workspaces.
//!
//! Runs the project's test command inside a workspace and treats the exit
//! status as pass/fail. A failing or timed-out run marks the workspace
//! errored with the (truncated) output, which also invalidates a previous
//! `done`.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use super::workspace::{WorkspaceError, WorkspaceManager};
use crate::config::{ResolvedConfig, DEFAULT_TEST_TIMEOUT_MS};

/// Lines of output kept when recording a failure.
const MAX_OUTPUT_LINES: usize = 200;

/// Marker files and the test command they imply, checked in order.
const ECOSYSTEMS: &[(&str, &str)] = &[
    ("Cargo.toml", "cargo test"),
    ("package.json", "npm test"),
    ("pyproject.toml", "pytest"),
    ("setup.py", "pytest"),
    ("go.mod", "go test ./..."),
    ("Makefile", "make test"),
];

/// Pick a test command from the files present in `root`.
pub fn detect_test_command(root: &Path) -> Option<String> {
    ECOSYSTEMS
        .iter()
        .find(|(marker, _)| root.join(marker).is_file())
        .map(|(_, command)| command.to_string())
}

/// Result of a verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerifyOutcome {
    Passed { command: String, output: String },
    Failed {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },
    TimedOut { command: String, timeout_ms: u64 },
    /// No command configured and no known ecosystem detected.
    NoTestCommand,
}

impl VerifyOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    /// Text recorded in the `errored` sentinel, if this outcome is a failure.
    fn failure_note(&self) -> Option<String> {
        match self {
            Self::Failed {
                command,
                exit_code,
                output,
            } => {
                let code = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                Some(format!("verification failed: `{command}` exited with {code}\n\n{output}"))
            }
            Self::TimedOut {
                command,
                timeout_ms,
            } => Some(format!(
                "verification timed out: `{command}` ran longer than {timeout_ms}ms"
            )),
            Self::Passed { .. } | Self::NoTestCommand => None,
        }
    }
}

/// Runs a workspace's tests.
#[derive(Debug, Clone)]
pub struct Verifier {
    command: Option<String>,
    timeout: Duration,
}

impl Default for Verifier {
    fn default() -> Self {
        Self {
            command: None,
            timeout: Duration::from_millis(DEFAULT_TEST_TIMEOUT_MS),
        }
    }
}

impl Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            command: config.test_command.clone(),
            timeout: Duration::from_millis(config.test_timeout_ms),
        }
    }

    /// Always run this command instead of detecting one.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the tests in `root` without touching any sentinel.
    pub async fn run(&self, root: &Path) -> Result<VerifyOutcome, WorkspaceError> {
        let Some(command) = self.command.clone().or_else(|| detect_test_command(root)) else {
            return Ok(VerifyOutcome::NoTestCommand);
        };

        let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        let mut cmd = Command::new(shell);
        cmd.arg(flag)
            .arg(&command)
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout takes down the whole test tree.
        #[cfg(unix)]
        cmd.process_group(0);

        debug!(command = %command, root = %root.display(), "Running verification");
        let child = cmd.spawn().map_err(WorkspaceError::io(root))?;
        let pid = child.id();
        let result = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                return Ok(VerifyOutcome::TimedOut {
                    command,
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
        };
        let output = result.map_err(WorkspaceError::io(root))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }
        let text = truncate_output(text.trim_end(), MAX_OUTPUT_LINES);

        if output.status.success() {
            Ok(VerifyOutcome::Passed {
                command,
                output: text,
            })
        } else {
            Ok(VerifyOutcome::Failed {
                command,
                exit_code: output.status.code(),
                output: text,
            })
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let group = Pid::from_raw(pid as i32);
    if let Err(e) = killpg(group, Signal::SIGKILL) {
        debug!(pid, "Process group already gone: {}", e);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

/// Truncate output by lines, keeping first and last portions.
fn truncate_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let total = lines.len();

    if total <= max_lines {
        return output.to_string();
    }

    let keep = max_lines / 2;
    let omitted = total - keep * 2;
    format!(
        "{}\n\n... [{omitted} lines omitted] ...\n\n{}",
        lines[..keep].join("\n"),
        lines[total - keep..].join("\n")
    )
}

impl WorkspaceManager {
    /// Run the verifier in a workspace. A failure marks it errored; a pass
    /// leaves its state alone.
    pub async fn verify(&self, name: &str, verifier: &Verifier) -> Result<VerifyOutcome, WorkspaceError> {
        let workspace = self.get(name)?;
        let outcome = verifier.run(&workspace.root).await?;

        match outcome.failure_note() {
            Some(note) => {
                self.mark_errored(name, &note)?;
            }
            None if outcome.is_passed() => {
                info!(workspace = %name, "Verification passed");
                self.events()
                    .info("verification passed", serde_json::json!({ "workspace": name }));
            }
            None => debug!(workspace = %name, "No test command detected"),
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_detect_test_command() {
        let dir = tempdir().unwrap();
        assert_eq!(detect_test_command(dir.path()), None);

        std::fs::write(dir.path().join("Makefile"), "test:\n").unwrap();
        assert_eq!(detect_test_command(dir.path()).as_deref(), Some("make test"));

        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(detect_test_command(dir.path()).as_deref(), Some("npm test"));

        std::fs::write(dir.path().join("Cargo.toml"), "").unwrap();
        assert_eq!(detect_test_command(dir.path()).as_deref(), Some("cargo test"));
    }

    #[test]
    fn test_detect_python_and_go() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module x").unwrap();
        assert_eq!(detect_test_command(dir.path()).as_deref(), Some("go test ./..."));

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("setup.py"), "").unwrap();
        assert_eq!(detect_test_command(dir.path()).as_deref(), Some("pytest"));
    }

    #[test]
    fn test_truncate_output() {
        let short = "a\nb\nc";
        assert_eq!(truncate_output(short, 10), short);

        let long: Vec<String> = (0..20).map(|i| format!("line {i}")).collect();
        let truncated = truncate_output(&long.join("\n"), 6);
        assert!(truncated.starts_with("line 0\nline 1\nline 2\n"));
        assert!(truncated.ends_with("line 17\nline 18\nline 19"));
        assert!(truncated.contains("[14 lines omitted]"));
    }

    #[test]
    fn test_failure_notes() {
        let failed = VerifyOutcome::Failed {
            command: "cargo test".to_string(),
            exit_code: Some(101),
            output: "test result: FAILED".to_string(),
        };
        let note = failed.failure_note().unwrap();
        assert!(note.contains("cargo test"));
        assert!(note.contains("101"));
        assert!(note.contains("FAILED"));

        assert!(VerifyOutcome::NoTestCommand.failure_note().is_none());
    }

    #[tokio::test]
    async fn test_no_command_detected() {
        let dir = tempdir().unwrap();
        let outcome = Verifier::new().run(dir.path()).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::NoTestCommand);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_pass_and_fail() {
        let dir = tempdir().unwrap();

        let outcome = Verifier::new()
            .with_command("echo all good")
            .run(dir.path())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            VerifyOutcome::Passed {
                command: "echo all good".to_string(),
                output: "all good".to_string(),
            }
        );

        let outcome = Verifier::new()
            .with_command("echo broken >&2; exit 3")
            .run(dir.path())
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            VerifyOutcome::Failed { exit_code: Some(3), ref output, .. } if output == "broken"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_timeout() {
        let dir = tempdir().unwrap();
        let outcome = Verifier::new()
            .with_command("sleep 5")
            .with_timeout(Duration::from_millis(50))
            .run(dir.path())
            .await
            .unwrap();
        assert!(matches!(outcome, VerifyOutcome::TimedOut { timeout_ms: 50, .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("survived");
        let command = format!("(sleep 1 && touch '{}') & wait", marker.display());

        let outcome = Verifier::new()
            .with_command(command)
            .with_timeout(Duration::from_millis(100))
            .run(dir.path())
            .await
            .unwrap();
        assert!(matches!(outcome, VerifyOutcome::TimedOut { .. }));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }
}
