//! `config show` and `config init`.

use super::resolve_config;
use crate::RunArgs;
use crate::exit;
use crate::logging::LogHandle;
use anyhow::Result;
use crossterm::style::Stylize;
use dockhand_core::resolve::write_default_config;
use std::path::Path;

/// Print the effective configuration in its file format.
pub fn show(args: &RunArgs, logs: &LogHandle) -> Result<u8> {
    let config = resolve_config(args, logs)?;
    println!("{}", serde_json::to_string_pretty(&config.to_document())?);
    Ok(exit::SUCCESS)
}

/// Write the default configuration document.
pub fn init(path: &Path, force: bool) -> Result<u8> {
    write_default_config(path, force)?;
    println!("{} wrote {}", "✓".green(), path.display());
    Ok(exit::SUCCESS)
}
