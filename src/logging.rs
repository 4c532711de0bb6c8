//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! The terminal belongs to the UI, so log lines go to a file. The filter
//! comes from `TESTDESK_LOG` if set, otherwise from the `-v` count or the
//! configured default level.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "TESTDESK_LOG";

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `testdesk=debug`
    pub filter: String,
    pub path: PathBuf,
}

impl LogConfig {
    /// `verbosity` is the number of `-v` flags; 0 keeps `default_level`.
    pub fn from_verbosity(verbosity: u8, default_level: &str, path: PathBuf) -> Self {
        let filter = match verbosity {
            0 => default_level.to_string(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        };
        Self { filter, path }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn open_log(path: &Path) -> io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber. Fails if the log file cannot be opened or
/// a subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let file = open_log(&config.path)?;
    let layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(layer)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_filter() {
        let path = PathBuf::from("x.log");
        assert_eq!(LogConfig::from_verbosity(0, "warn", path.clone()).filter, "warn");
        assert_eq!(LogConfig::from_verbosity(1, "warn", path.clone()).filter, "debug");
        assert_eq!(LogConfig::from_verbosity(3, "warn", path).filter, "trace");
    }

    #[test]
    fn open_log_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("testdesk.log");
        open_log(&path).unwrap();
        assert!(path.exists());
    }
}
