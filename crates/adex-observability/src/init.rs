// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always; with the `file-logging` feature also a JSON log
//! per run:
//!
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── adex.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, ObservabilityConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps file writers alive; drop it last to flush
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guard: tracing_appender::non_blocking::WorkerGuard,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder holding the log file, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Build the filter from debug flags and the configured default level
///
/// # Errors
///
/// Fails if the level is not a valid filter directive.
pub fn build_filter(debug_flags: &CrateDebugFlags, config: &ObservabilityConfig) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(&config.level);
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter: {}", directives))
}

fn console_layer(config: &ObservabilityConfig, filter: EnvFilter) -> BoxedLayer {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);
    match config.format {
        LogFormat::Text => layer.with_filter(filter).boxed(),
        LogFormat::Compact => layer.compact().with_filter(filter).boxed(),
    }
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails on an invalid level, when the run folder cannot be created, or
/// when a global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &ObservabilityConfig) -> Result<LoggingGuard> {
    #[cfg_attr(not(feature = "file-logging"), allow(unused_mut))]
    let mut layers: Vec<BoxedLayer> = vec![console_layer(config, build_filter(debug_flags, config)?)];

    #[cfg(feature = "file-logging")]
    let (file_guard, run_folder) = {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let run_folder = config.log_dir.join(format!("run_{}", timestamp));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
        cleanup_old_runs(&config.log_dir, config.retention_runs)?;

        let appender = tracing_appender::rolling::never(&run_folder, "adex.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(build_filter(debug_flags, config)?)
            .boxed();
        layers.push(file_layer);
        (guard, run_folder)
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    #[cfg(feature = "file-logging")]
    return Ok(LoggingGuard {
        _file_guard: file_guard,
        log_dir: Some(run_folder),
    });

    #[cfg(not(feature = "file-logging"))]
    Ok(LoggingGuard { log_dir: None })
}

/// Delete all but the `keep` most recent `run_*` folders
///
/// Folder names sort chronologically.
#[cfg(feature = "file-logging")]
pub fn cleanup_old_runs(base_log_dir: &Path, keep: usize) -> Result<()> {
    if !base_log_dir.exists() {
        return Ok(());
    }

    let mut runs: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        let is_run = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with("run_"));
        if path.is_dir() && is_run {
            runs.push(path);
        }
    }
    runs.sort();

    let excess = runs.len().saturating_sub(keep);
    for path in runs.iter().take(excess) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!("Warning: Failed to remove old log directory {}: {}", path.display(), e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_flags_and_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-adex-dynamics".to_string()]);
        assert!(build_filter(&flags, &ObservabilityConfig::with_level("warn")).is_ok());
    }

    #[test]
    fn test_filter_rejects_bad_level() {
        let flags = CrateDebugFlags::default();
        assert!(build_filter(&flags, &ObservabilityConfig::with_level("very=loud=please")).is_err());
    }

    #[cfg(feature = "file-logging")]
    #[test]
    fn test_cleanup_keeps_most_recent_runs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["run_20250101_000000", "run_20250102_000000", "run_20250103_000000", "notes"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }

        cleanup_old_runs(dir.path(), 2).unwrap();

        assert!(!dir.path().join("run_20250101_000000").exists());
        assert!(dir.path().join("run_20250102_000000").exists());
        assert!(dir.path().join("run_20250103_000000").exists());
        assert!(dir.path().join("notes").exists());
    }
}
