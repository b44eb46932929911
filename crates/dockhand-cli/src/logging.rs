//! Tracing setup.
//!
//! Diagnostics go to stderr so stdout stays clean for progress output and
//! `--json`. The filter starts from `RUST_LOG` or `--log-level`, and is
//! swapped for the configured level once configuration has been resolved.
//! An explicit `RUST_LOG` always wins.

use dockhand_schema::LogLevel;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

pub struct LogHandle {
    reload: reload::Handle<EnvFilter, Registry>,
    pinned_by_env: bool,
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("pinned_by_env", &self.pinned_by_env)
            .finish_non_exhaustive()
    }
}

/// Install the global subscriber.
pub fn init(cli_level: Option<&str>) -> LogHandle {
    let from_env = std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok());
    let pinned_by_env = from_env.is_some();

    let initial = from_env.unwrap_or_else(|| {
        let level = cli_level
            .and_then(|l| l.parse::<LogLevel>().ok())
            .unwrap_or_default();
        EnvFilter::new(level.filter_directive())
    });

    let (filter, reload) = reload::Layer::new(initial);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();

    LogHandle {
        reload,
        pinned_by_env,
    }
}

impl LogHandle {
    /// Switch to the resolved configuration's level.
    pub fn apply(&self, level: LogLevel) {
        if self.pinned_by_env {
            return;
        }
        let _ = self
            .reload
            .modify(|filter| *filter = EnvFilter::new(level.filter_directive()));
    }
}
