//! dockhand - install and verify Docker Engine on Linux hosts

use clap::Parser;
use crossterm::style::Stylize;
use std::io::IsTerminal;
use std::process::ExitCode;

use dockhand_cli::{Cli, Commands, ConfigCommands, cmd, exit, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if !std::io::stdout().is_terminal() {
        crossterm::style::force_color_output(false);
    }
    let logs = logging::init(cli.run.log_level.as_deref());

    let result = match cli.command {
        None => cmd::install::install(&cli.run, &logs).await,
        Some(Commands::Plan) => cmd::plan::plan(&cli.run, &logs),
        Some(Commands::Probe) => cmd::probe::probe(&cli.run, &logs),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => cmd::config::show(&cli.run, &logs),
            ConfigCommands::Init { path, force } => cmd::config::init(&path, force),
        },
        Some(Commands::Completions { shell }) => {
            cmd::completions::completions(shell);
            Ok(exit::SUCCESS)
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(exit::for_error(&err))
        }
    }
}
