use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

/// Environment variable that overrides `logging.level`.
pub const LOG_ENV: &str = "ENCORE_LOG";

/// Pick the filter directive: a non-empty `ENCORE_LOG` wins over the
/// configured level.
pub fn filter_directive(env_value: Option<String>, configured: &str) -> String {
    env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| configured.to_string())
}

fn build_filter(settings: &LoggingSettings) -> EnvFilter {
    let directive = filter_directive(std::env::var(LOG_ENV).ok(), &settings.level);
    EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("encore: invalid log filter {directive:?} ({e}), using \"info\"");
        EnvFilter::new("info")
    })
}

/// Install the global subscriber writing to the log file. The terminal
/// belongs to the UI, so nothing is logged to stdout or stderr.
///
/// Returns the log file in use, or `None` when logging stays disabled.
pub fn init(settings: &LoggingSettings) -> Option<PathBuf> {
    let path = settings.resolved_file()?;
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("encore: cannot create log directory {}: {e}", parent.display());
            return None;
        }
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("encore: cannot open log file {}: {e}", path.display());
            return None;
        }
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(Mutex::new(file));

    match tracing_subscriber::registry()
        .with(build_filter(settings))
        .with(fmt_layer)
        .try_init()
    {
        Ok(()) => Some(path),
        Err(e) => {
            eprintln!("encore: logging already initialized: {e}");
            None
        }
    }
}
