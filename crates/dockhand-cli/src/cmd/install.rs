//! The default command: run the installation.

use super::{plan, probe_host, resolve_config};
use crate::RunArgs;
use crate::exit;
use crate::logging::LogHandle;
use crate::ui::ConsoleReporter;
use anyhow::Result;
use dockhand_core::{Credential, NullReporter, Orchestrator, Reporter, SystemRunner};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Probe, plan and execute every enabled step.
///
/// The orchestrator runs on a blocking worker. Ctrl-C raises the cancel
/// flag; the command in flight finishes and no further step starts.
pub async fn install(args: &RunArgs, logs: &LogHandle) -> Result<u8> {
    let config = resolve_config(args, logs)?;
    let host = probe_host(&config)?;
    info!(
        distro = %host.distribution.id,
        arch = %host.architecture,
        repo = %host.package_repo_url,
        "probed host"
    );

    if args.dry_run {
        return plan::render(&config, &host, args.json);
    }

    let credential = config.credential_file().map(Credential::load).transpose()?;
    debug!(with_credential = credential.is_some(), "preparing runner");
    let runner = SystemRunner::new(credential);
    let orchestrator = Orchestrator::new(config, host, runner);

    let console = (!args.json).then(|| Arc::new(ConsoleReporter::new()));
    let reporter: Arc<dyn Reporter> = match &console {
        Some(c) => Arc::clone(c) as Arc<dyn Reporter>,
        None => Arc::new(NullReporter),
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let mut worker = {
        let reporter = Arc::clone(&reporter);
        let cancel = Arc::clone(&cancel);
        tokio::task::spawn_blocking(move || orchestrator.run(&*reporter, &cancel))
    };

    let report = tokio::select! {
        joined = &mut worker => joined?,
        Ok(()) = tokio::signal::ctrl_c() => {
            cancel.store(true, Ordering::SeqCst);
            reporter.warning("interrupted; stopping after the current step");
            worker.await?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if let Some(console) = &console {
        console.flush().await;
    }
    Ok(exit::for_report(&report))
}
