//! Log setup. The terminal belongs to the TUI, so events go to a file.

use std::env;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

/// `NOVA_LOG` overrides the configured level.
const FILTER_ENV: &str = "NOVA_LOG";

fn log_path_from(state_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    let base = match state_home.filter(|s| !s.is_empty()) {
        Some(xdg) => PathBuf::from(xdg),
        None => PathBuf::from(home?).join(".local").join("state"),
    };
    Some(base.join("nova").join("nova.log"))
}

/// `$XDG_STATE_HOME/nova/nova.log`, or `~/.local/state/nova/nova.log`.
pub fn default_log_path() -> Option<PathBuf> {
    log_path_from(env::var_os("XDG_STATE_HOME"), env::var_os("HOME"))
}

/// Install the global subscriber. Returns the file being written, or `None`
/// when no log file could be opened (logging is then off).
pub fn init(settings: &LoggingSettings) -> Option<PathBuf> {
    let path = settings.file.clone().or_else(default_log_path)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    let filter = EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .ok()?;
    Some(path)
}
