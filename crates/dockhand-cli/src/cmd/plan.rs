//! `dockhand plan` and `--dry-run`.

use super::{probe_host, resolve_config};
use crate::RunArgs;
use crate::exit;
use crate::logging::LogHandle;
use crate::ui::table::plan_table;
use anyhow::Result;
use crossterm::style::Stylize;
use dockhand_core::{StepDefinition, all_steps, check_supported};
use dockhand_schema::{EffectiveConfig, HostProfile, StepId};

pub fn plan(args: &RunArgs, logs: &LogHandle) -> Result<u8> {
    let config = resolve_config(args, logs)?;
    let host = probe_host(&config)?;
    render(&config, &host, args.json)
}

/// Show what a run would do on `host` without executing anything.
pub fn render(config: &EffectiveConfig, host: &HostProfile, json: bool) -> Result<u8> {
    let steps: Vec<StepId> = all_steps()
        .into_iter()
        .filter(|step| step.enabled_in(config))
        .map(StepDefinition::id)
        .collect();
    let support = check_supported(host);

    if json {
        let value = serde_json::json!({
            "host": host,
            "steps": steps,
            "supported": support.is_ok(),
            "reason": support.as_ref().err().map(ToString::to_string),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "{} ({}) via {}",
            host.distribution.name.as_str().bold(),
            host.architecture,
            host.package_repo_url.as_str().dark_grey()
        );
        if steps.is_empty() {
            println!("nothing to do: every step is disabled");
        } else {
            println!("{}", plan_table(&steps));
        }
        if let Err(err) = &support {
            eprintln!("{} {err}", "✗ unsupported host:".red());
        }
    }

    Ok(if support.is_ok() {
        exit::SUCCESS
    } else {
        exit::UNSUPPORTED_HOST
    })
}
