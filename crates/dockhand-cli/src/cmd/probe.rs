//! `dockhand probe`

use super::{probe_host, resolve_config};
use crate::RunArgs;
use crate::exit;
use crate::logging::LogHandle;
use crate::ui::table::host_table;
use anyhow::Result;
use crossterm::style::Stylize;
use dockhand_core::check_supported;

/// Print the detected host profile and whether Docker can be installed on it.
pub fn probe(args: &RunArgs, logs: &LogHandle) -> Result<u8> {
    let config = resolve_config(args, logs)?;
    let host = probe_host(&config)?;
    let support = check_supported(&host);

    if args.json {
        let value = serde_json::json!({
            "host": host,
            "supported": support.is_ok(),
            "reason": support.as_ref().err().map(ToString::to_string),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", host_table(&host));
        match &support {
            Ok(()) => println!("{} supported", "✓".green()),
            Err(err) => println!("{} {err}", "✗".red()),
        }
    }
    Ok(exit::SUCCESS)
}
