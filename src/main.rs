// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Warden main entry point - CLI for workspace lifecycle and permission checks.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

use warden::config::{self, CliOptions, ResolvedConfig};
use warden::intercept::ActionInterceptor;
use warden::orchestrate::{
    find_repo_root, GitCli, MergeCoordinator, MergeOutcome, StatusSummary, Verifier,
    VerifyOutcome, WorkspaceManager, WorkspaceState,
};
use warden::permissions::{BoundWorkspace, Decision, PermissionRegistry, Registration, Role};
use warden::telemetry::{init_telemetry, TelemetryConfig};

/// Exit code for a denied `check`.
const EXIT_DENIED: i32 = 2;

/// Warden - keeps parallel coding agents out of each other's way.
#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about = "Workspace isolation and capability gating for parallel coding agents", long_about = None)]
struct Cli {
    /// Repository root (defaults to the enclosing git repository)
    #[arg(long, global = true, env = "WARDEN_REPO")]
    repo: Option<PathBuf>,

    /// Branch finished workspaces merge into
    #[arg(long, global = true, env = "WARDEN_BASE_BRANCH")]
    base_branch: Option<String>,

    /// Deny mutations from unregistered sessions
    #[arg(long, global = true)]
    strict: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Show debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an example config file in the repository
    Init,

    /// Print the resolved configuration
    Config,

    /// Create a workspace for a branch
    Create {
        /// Branch name (created from the base branch if missing)
        branch: String,
        /// Task description recorded in the workspace
        task: String,
    },

    /// Mark a workspace done
    Done {
        name: String,
        /// Short summary of the work
        #[arg(default_value = "")]
        summary: String,
    },

    /// Mark a workspace blocked
    Blocked { name: String, reason: String },

    /// Mark a workspace errored
    Errored { name: String, details: String },

    /// Clear every terminal marker on a workspace
    Reopen { name: String },

    /// Remove a workspace
    Remove {
        name: String,
        /// Remove even if the workspace is not done or has local changes
        #[arg(long)]
        force: bool,
    },

    /// Merge a finished workspace into the base branch
    Merge { name: String },

    /// Run the test command inside a workspace
    Verify {
        name: String,
        /// Test command (defaults to config, then auto-detection)
        #[arg(long)]
        command: Option<String>,
        /// Timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Show the state of every workspace
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Authorize a single tool call and print the decision
    Check {
        /// Agent role
        #[arg(long)]
        role: String,
        /// Tool name (e.g. write_file, bash)
        #[arg(long)]
        tool: String,
        /// Tool input as JSON
        #[arg(long, default_value = "{}")]
        input: String,
        /// Allowed path glob (repeatable)
        #[arg(long = "allowed")]
        allowed: Vec<String>,
        /// Denied path glob (repeatable)
        #[arg(long = "denied")]
        denied: Vec<String>,
        /// Workspace root the session is confined to
        #[arg(long)]
        workspace_root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = init_telemetry(&TelemetryConfig::for_cli(cli.verbose, cli.debug))
        .context("failed to initialize logging")?;

    let repo_root = resolve_repo_root(cli.repo.as_deref())?;
    let cli_options = CliOptions {
        base_branch: cli.base_branch,
        strict_mode: if cli.strict { Some(true) } else { None },
        ..Default::default()
    };

    handle_command(cli.command, &repo_root, cli_options).await
}

fn resolve_repo_root(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    Ok(find_repo_root(&cwd).unwrap_or(cwd))
}

fn workspace_manager(repo_root: &Path, config: &ResolvedConfig) -> WorkspaceManager {
    WorkspaceManager::new(Arc::new(GitCli::new(repo_root)), config.layout(repo_root))
        .with_base_branch(config.base_branch.clone())
        .with_event_log(config.event_log(repo_root))
}

async fn handle_command(
    command: Commands,
    repo_root: &Path,
    cli_options: CliOptions,
) -> anyhow::Result<()> {
    let config = config::load_config(repo_root, cli_options)?;
    let manager = workspace_manager(repo_root, &config);

    match command {
        Commands::Init => {
            let path = config::init_config(repo_root, None)?;
            println!("Created config file: {}", path.display());
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Create { branch, task } => {
            let workspace = manager.create(&branch, &task).await?;
            println!(
                "{} {} at {}",
                "Created".green().bold(),
                workspace.name.bright_white(),
                workspace.root.display()
            );
            println!("Base: {}", workspace.base_branch);
        }
        Commands::Done { name, summary } => {
            let state = manager.mark_done(&name, &summary)?;
            print_transition(&name, state);
        }
        Commands::Blocked { name, reason } => {
            let state = manager.mark_blocked(&name, &reason)?;
            print_transition(&name, state);
        }
        Commands::Errored { name, details } => {
            let state = manager.mark_errored(&name, &details)?;
            print_transition(&name, state);
        }
        Commands::Reopen { name } => {
            let state = manager.reopen(&name)?;
            print_transition(&name, state);
        }
        Commands::Remove { name, force } => {
            manager.remove(&name, force).await?;
            println!("{} {}", "Removed".green().bold(), name.bright_white());
        }
        Commands::Merge { name } => {
            let outcome = MergeCoordinator::new(&manager).merge(&name).await?;
            print_merge(&outcome);
            if !outcome.is_merged() {
                std::process::exit(1);
            }
        }
        Commands::Verify {
            name,
            command,
            timeout_ms,
        } => {
            let mut verifier = Verifier::from_config(&config);
            if let Some(command) = command {
                verifier = verifier.with_command(command);
            }
            if let Some(ms) = timeout_ms {
                verifier = verifier.with_timeout(Duration::from_millis(ms));
            }
            let outcome = manager.verify(&name, &verifier).await?;
            print_verify(&name, &outcome);
            if matches!(outcome, VerifyOutcome::Failed { .. } | VerifyOutcome::TimedOut { .. }) {
                std::process::exit(1);
            }
        }
        Commands::Status { json } => {
            let summary = manager.status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_status(&summary);
            }
        }
        Commands::Check {
            role,
            tool,
            input,
            allowed,
            denied,
            workspace_root,
        } => {
            let role: Role = role.parse()?;
            let mut input: serde_json::Value =
                serde_json::from_str(&input).context("--input is not valid JSON")?;

            let session_id = uuid::Uuid::new_v4().to_string();
            let mut registration = Registration::new(session_id.as_str(), role)
                .with_allowed_paths(allowed)
                .with_denied_paths(denied);
            if let Some(root) = workspace_root {
                let name = root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                registration = registration.bound_to(BoundWorkspace::new(name, root));
            }

            let registry = PermissionRegistry::with_policy(config.registry_policy());
            registry.register(registration).await;
            let interceptor = ActionInterceptor::new(registry)
                .with_denylist(config.denylist())
                .with_event_log(config.event_log(repo_root));

            let decision = interceptor
                .intercept_tool_call(&session_id, &tool, &mut input)
                .await;
            match decision {
                Decision::Allow => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "decision": "allow",
                            "input": input,
                        }))?
                    );
                }
                Decision::Deny(reason) => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "decision": "deny",
                            "reason": reason.to_string(),
                            "detail": reason,
                        }))?
                    );
                    std::process::exit(EXIT_DENIED);
                }
            }
        }
    }
    Ok(())
}

fn state_label(state: WorkspaceState) -> colored::ColoredString {
    match state {
        WorkspaceState::Done => state.as_str().green(),
        WorkspaceState::Blocked => state.as_str().yellow(),
        WorkspaceState::Errored => state.as_str().red(),
        WorkspaceState::InProgress => state.as_str().cyan(),
    }
}

fn print_transition(name: &str, state: WorkspaceState) {
    println!("{} is now {}", name.bright_white(), state_label(state).bold());
}

fn print_status(summary: &StatusSummary) {
    if summary.total == 0 {
        println!("{}", "No workspaces".dimmed());
        return;
    }

    println!(
        "{}",
        format!("{} workspace(s)", summary.total).bright_blue().bold()
    );
    for row in &summary.rows {
        println!(
            "  {:<12} {} - {}",
            state_label(row.state),
            row.name.bright_white(),
            row.task
        );
        if let Some(note) = &row.note {
            println!("  {:<12} {}", "", note.dimmed());
        }
    }
    println!(
        "\ndone {} | in progress {} | blocked {} | errored {}",
        summary.done, summary.in_progress, summary.blocked, summary.errored
    );
    if summary.all_done() {
        println!("{}", "All workspaces done".green());
    }
}

fn print_merge(outcome: &MergeOutcome) {
    match outcome {
        MergeOutcome::Merged { branch, target, .. } => {
            println!("{} {} into {}", "Merged".green().bold(), branch, target);
        }
        MergeOutcome::Conflict {
            branch,
            target,
            files,
            output,
            aborted,
        } => {
            println!(
                "{} merging {} into {}",
                "Conflict".red().bold(),
                branch,
                target
            );
            for file in files {
                println!("  {}", file);
            }
            if !aborted {
                println!("{}", "Merge abort failed; resolve the checkout by hand".yellow());
            }
            println!("\n{}", output.dimmed());
        }
        MergeOutcome::Failed { reason } => {
            println!("{} {}", "Merge failed:".red().bold(), reason);
        }
        MergeOutcome::Denied { reason } => {
            println!("{} {}", "Merge denied:".yellow().bold(), reason);
        }
    }
}

fn print_verify(name: &str, outcome: &VerifyOutcome) {
    match outcome {
        VerifyOutcome::Passed { command, .. } => {
            println!("{} {} (`{}`)", "Passed".green().bold(), name, command);
        }
        VerifyOutcome::Failed {
            command, output, ..
        } => {
            println!("{} {} (`{}`)", "Failed".red().bold(), name, command);
            println!("{}", output);
        }
        VerifyOutcome::TimedOut {
            command,
            timeout_ms,
        } => {
            println!(
                "{} {} (`{}` after {}ms)",
                "Timed out".red().bold(),
                name,
                command,
                timeout_ms
            );
        }
        VerifyOutcome::NoTestCommand => {
            println!("{}", "No test command configured or detected".yellow());
        }
    }
}
