// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization
//!
//! Console output always; a log file as well when `file-logging` is enabled
//! and a path is configured.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

/// Keeps background log writers alive; flushes on drop
#[derive(Default)]
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Filter directives for `config` with the debug flags layered on top
///
/// `RUST_LOG`, when set, replaces both.
pub fn filter_directives(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> String {
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        if !rust_log.trim().is_empty() {
            return rust_log;
        }
    }
    let mut directives: Vec<String> = debug_flags
        .to_filter_string()
        .split(',')
        .filter(|d| *d != "info")
        .map(str::to_string)
        .collect();
    directives.push(config.level.clone());
    directives.join(",")
}

/// Install the global subscriber
///
/// # Errors
/// Fails on an unparsable filter, an unwritable log file, or when a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    let directives = filter_directives(config, debug_flags);
    let env_filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter: {}", directives))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console_layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(config.show_targets)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };
    layers.push(console_layer.with_filter(env_filter).boxed());

    #[cfg(feature = "file-logging")]
    let file_guard = match &config.file_path {
        Some(path) => {
            let (layer, guard) = file_layer(path, &directives)?;
            layers.push(layer);
            Some(guard)
        }
        None => None,
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guard: file_guard,
    })
}

#[cfg(feature = "file-logging")]
fn file_layer(
    path: &std::path::Path,
    directives: &str,
) -> Result<(
    Box<dyn Layer<Registry> + Send + Sync>,
    tracing_appender::non_blocking::WorkerGuard,
)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("Log path has no file name: {}", path.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_new(directives)
        .with_context(|| format!("Invalid log filter: {}", directives))?;
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter)
        .boxed();
    Ok((layer, guard))
}

/// Console logging at `info` plus the given debug flags
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(&LoggingConfig::default(), debug_flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_put_base_level_last() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let flags = CrateDebugFlags::from_args(vec!["--debug-spikecore-config".to_string()]);
        let config = LoggingConfig {
            level: "warn".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(filter_directives(&config, &flags), "spikecore-config=debug,warn");
        assert_eq!(
            filter_directives(&config, &CrateDebugFlags::default()),
            "warn"
        );
    }
}
