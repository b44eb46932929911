//! Subcommand implementations.
//!
//! Each command returns the process exit code; errors bubble up as
//! `anyhow::Error` and are mapped by [`crate::exit::for_error`].

pub mod completions;
pub mod config;
pub mod install;
pub mod plan;
pub mod probe;

use crate::RunArgs;
use crate::logging::LogHandle;
use dockhand_core::{CliOverrides, ConfigError, ProbeError, Prober, ResolveRequest, resolve};
use dockhand_schema::{EffectiveConfig, HostProfile};

/// Resolve configuration from the shared flags and apply its log level.
pub fn resolve_config(args: &RunArgs, logs: &LogHandle) -> Result<EffectiveConfig, ConfigError> {
    let request = ResolveRequest {
        config_path: args.config.clone(),
        override_path: args.override_file.clone(),
        cli: CliOverrides {
            steps: args.steps.clone(),
            password_file: args.password_file.clone(),
            log_level: args.log_level.clone(),
            repo_url: args.repo_url.clone(),
        },
        ..ResolveRequest::default()
    };
    let config = resolve(request)?;
    logs.apply(config.log_level());
    Ok(config)
}

/// Probe the running host against the configured repository.
pub fn probe_host(config: &EffectiveConfig) -> Result<HostProfile, ProbeError> {
    Prober::system(config.repository_base_url()).probe()
}
