// ============================================================
// Layer 6 — Logging
// ============================================================
// Installs the global tracing subscriber once, at the top of
// main. Two outputs share one filter:
//
//   console  → human readable, coloured
//   file     → logs/<MM_DD_YYYY_HH_MM_SS>.log, plain text
//
// The filter comes from RUST_LOG when set, otherwise
// `ames_price=info,actix_web=info` (the second directive lets
// the HTTP request log through). The returned LogGuard syncs
// the log file when it is dropped at the end of main.

use std::{
    fs::{self, File},
    path::Path,
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::Local;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "ames_price=info,actix_web=info";

/// Keeps the log file open for the life of the program.
pub struct LogGuard {
    file: Arc<File>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        // Nothing useful can be done with a failure this late
        let _ = self.file.sync_all();
    }
}

/// File name for a log opened now, e.g. `05_01_2024_10_12_03.log`.
pub fn log_file_name() -> String {
    format!("{}.log", Local::now().format("%m_%d_%Y_%H_%M_%S"))
}

pub fn init(log_dir: impl AsRef<Path>) -> Result<LogGuard> {
    let log_dir = log_dir.as_ref();
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Cannot create log directory '{}'", log_dir.display()))?;

    let path = log_dir.join(log_file_name());
    let file = Arc::new(
        File::create(&path).with_context(|| format!("Cannot create log file '{}'", path.display()))?,
    );

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Arc::clone(&file)))
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::debug!("Logging to '{}'", path.display());
    Ok(LogGuard { file })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name_shape() {
        let name = log_file_name();
        let stem = name.strip_suffix(".log").unwrap();
        let parts: Vec<&str> = stem.split('_').collect();
        assert_eq!(parts.len(), 6);
        assert_eq!(parts[2].len(), 4);
        assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
    }
}
