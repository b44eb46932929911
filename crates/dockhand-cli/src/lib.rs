//! dockhand - install and verify Docker Engine on Linux hosts
//!
//! Running `dockhand` with no subcommand performs an installation run:
//! probe the host, resolve the configuration, plan the enabled steps and
//! execute them in order with privilege escalation.
//!
//! # Architecture
//!
//! - **Worker + signal task**: the orchestrator runs on one blocking worker
//!   while the async main task waits for Ctrl-C and raises the cancel flag.
//! - **UI actor**: all console output goes through a single thread fed by
//!   a channel, so progress lines never interleave.
//! - **Exit codes**: see [`exit`].
#![allow(missing_docs)]
#![allow(clippy::doc_markdown)]

pub mod cmd;
pub mod exit;
pub mod logging;
pub mod ui;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dockhand")]
#[command(
    version = env!("DOCKHAND_VERSION"),
    about = "Install and verify Docker Engine, Compose and friends on Linux hosts"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags shared by the install run and the inspection subcommands.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Run only these steps (prerequisites, engine, compose, tools, service, group, verify)
    #[arg(long, global = true, num_args = 1.., value_delimiter = ',', value_name = "STEP")]
    pub steps: Option<Vec<String>>,

    /// File whose first line is the sudo password (must be chmod 600)
    #[arg(long, global = true, value_name = "PATH")]
    pub password_file: Option<PathBuf>,

    /// DEBUG, INFO, WARNING or ERROR (RUST_LOG takes precedence)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Configuration file (defaults to ./config.json when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override file layered on top of --config
    #[arg(long = "override", global = true, value_name = "PATH")]
    pub override_file: Option<PathBuf>,

    /// Docker package repository root
    #[arg(long, global = true, value_name = "URL")]
    pub repo_url: Option<String>,

    /// Print the plan without executing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print machine-readable JSON instead of progress output
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show which steps would run on this host
    Plan,
    /// Show the detected host profile
    Probe,
    /// Inspect or create configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as JSON
    Show,
    /// Write the default configuration document
    Init {
        /// Where to write it (.json or .toml)
        #[arg(long, default_value = dockhand_core::paths::DEFAULT_CONFIG_FILE)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_steps_accept_spaces_and_commas() {
        let cli = Cli::parse_from(["dockhand", "--steps", "engine,verify", "--dry-run"]);
        assert_eq!(
            cli.run.steps,
            Some(vec!["engine".to_string(), "verify".to_string()])
        );
        assert!(cli.run.dry_run);

        let cli = Cli::parse_from(["dockhand", "plan", "--steps", "docker", "group"]);
        assert!(matches!(cli.command, Some(Commands::Plan)));
        assert_eq!(cli.run.steps.map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_config_init_defaults_to_config_json() {
        let cli = Cli::parse_from(["dockhand", "config", "init"]);
        match cli.command {
            Some(Commands::Config {
                command: ConfigCommands::Init { path, force },
            }) => {
                assert_eq!(path, PathBuf::from("config.json"));
                assert!(!force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
