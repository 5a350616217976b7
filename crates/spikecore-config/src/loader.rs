// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runtime options loading with override support
//!
//! Options are resolved in three tiers:
//! 1. TOML file (`spikecore.toml`), or built-in defaults when none exists
//! 2. Environment variables
//! 3. CLI arguments

use crate::validation::validate_options;
use crate::{ConfigResult, CoreOptions, LoadError};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default options file name
pub const OPTIONS_FILE_NAME: &str = "spikecore.toml";

/// Environment variable naming an explicit options file
pub const OPTIONS_PATH_ENV: &str = "SPIKECORE_OPTIONS_PATH";

/// Find the options file
///
/// Search order:
/// 1. `SPIKECORE_OPTIONS_PATH` environment variable
/// 2. Current working directory: `./spikecore.toml`
/// 3. Up to 5 parent directories
///
/// Returns `Ok(None)` when no file exists; defaults apply in that case.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if `SPIKECORE_OPTIONS_PATH` names a
/// missing file
pub fn find_options_file() -> ConfigResult<Option<PathBuf>> {
    if let Ok(env_path) = env::var(OPTIONS_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(LoadError::FileNotFound(format!(
            "Options file specified by {} not found: {}",
            OPTIONS_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(OPTIONS_FILE_NAME));

        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(OPTIONS_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    Ok(search_paths.into_iter().find(|path| path.exists()))
}

/// Parse options from TOML text without applying overrides
pub fn parse_options(content: &str) -> ConfigResult<CoreOptions> {
    Ok(toml::from_str(content)?)
}

/// Load runtime options
///
/// # Arguments
///
/// * `options_path` - Optional path to the options file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the file cannot be read, contains invalid TOML, or the
/// resulting options fail validation
pub fn load_options(
    options_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<CoreOptions> {
    let options_file = match options_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_options_file()?,
    };

    let mut options = match &options_file {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            info!(target: "spikecore-config", "Loaded options from {}", path.display());
            parse_options(&content)?
        }
        None => {
            debug!(target: "spikecore-config", "No {} found, using defaults", OPTIONS_FILE_NAME);
            CoreOptions::default()
        }
    };

    apply_environment_overrides(&mut options);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut options, cli);
    }

    validate_options(&options)?;
    Ok(options)
}

fn parse_bool(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower == "true" || value == "1" || lower == "yes"
}

/// Parse an optional per-tick budget; `none`/empty clears it
fn parse_budget(value: &str) -> Option<Option<u32>> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Some(None);
    }
    trimmed.parse::<u32>().ok().map(Some)
}

/// Apply environment variable overrides to options
///
/// Supported environment variables:
/// - `SPIKECORE_QUEUE_CAPACITY` -> `queue.capacity`
/// - `SPIKECORE_DISCARD_LATE_EVENTS` -> `queue.discard_late_events`
/// - `SPIKECORE_MAX_EVENTS_PER_TICK` -> `queue.max_events_per_tick`
/// - `SPIKECORE_MULTISYNAPTIC` -> `accumulation.multisynaptic`
pub fn apply_environment_overrides(options: &mut CoreOptions) {
    if let Ok(value) = env::var("SPIKECORE_QUEUE_CAPACITY") {
        if let Ok(capacity) = value.parse::<usize>() {
            options.queue.capacity = capacity;
        }
    }
    if let Ok(value) = env::var("SPIKECORE_DISCARD_LATE_EVENTS") {
        options.queue.discard_late_events = parse_bool(&value);
    }
    if let Ok(value) = env::var("SPIKECORE_MAX_EVENTS_PER_TICK") {
        if let Some(budget) = parse_budget(&value) {
            options.queue.max_events_per_tick = budget;
        }
    }
    if let Ok(value) = env::var("SPIKECORE_MULTISYNAPTIC") {
        options.accumulation.multisynaptic = parse_bool(&value);
    }
}

/// Apply CLI argument overrides to options
///
/// Recognised keys: `queue_capacity`, `discard_late_events`,
/// `max_events_per_tick`, `multisynaptic`.
pub fn apply_cli_overrides(options: &mut CoreOptions, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("queue_capacity") {
        if let Ok(capacity) = value.parse::<usize>() {
            options.queue.capacity = capacity;
        }
    }
    if let Some(value) = cli_args.get("discard_late_events") {
        options.queue.discard_late_events = parse_bool(value);
    }
    if let Some(value) = cli_args.get("max_events_per_tick") {
        if let Some(budget) = parse_budget(value) {
            options.queue.max_events_per_tick = budget;
        }
    }
    if let Some(value) = cli_args.get("multisynaptic") {
        options.accumulation.multisynaptic = parse_bool(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DescriptorLayout;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 4] = [
        "SPIKECORE_QUEUE_CAPACITY",
        "SPIKECORE_DISCARD_LATE_EVENTS",
        "SPIKECORE_MAX_EVENTS_PER_TICK",
        "SPIKECORE_MULTISYNAPTIC",
    ];

    fn clear_override_vars() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_find_options_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let options_path = dir.path().join("custom.toml");
        File::create(&options_path).unwrap();

        env::set_var(OPTIONS_PATH_ENV, options_path.to_str().unwrap());
        let result = find_options_file();
        env::remove_var(OPTIONS_PATH_ENV);

        assert_eq!(result.unwrap(), Some(options_path));
    }

    #[test]
    fn test_find_options_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        env::set_var(OPTIONS_PATH_ENV, missing.to_str().unwrap());
        let result = find_options_file();
        env::remove_var(OPTIONS_PATH_ENV);

        assert!(matches!(result, Err(LoadError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_options() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let options_path = dir.path().join(OPTIONS_FILE_NAME);

        let mut file = File::create(&options_path).unwrap();
        writeln!(file, "[queue]").unwrap();
        writeln!(file, "capacity = 100").unwrap();
        writeln!(file, "[descriptor]").unwrap();
        writeln!(file, "layout = \"wta\"").unwrap();

        let options = load_options(Some(&options_path), None).unwrap();

        assert_eq!(options.queue.capacity, 100);
        assert!(options.queue.discard_late_events);
        assert_eq!(options.descriptor.layout, DescriptorLayout::Wta);
    }

    #[test]
    fn test_invalid_toml() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let options_path = dir.path().join(OPTIONS_FILE_NAME);
        let mut file = File::create(&options_path).unwrap();
        writeln!(file, "[queue").unwrap();

        assert!(matches!(
            load_options(Some(&options_path), None),
            Err(LoadError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut options = CoreOptions::default();

        env::set_var("SPIKECORE_QUEUE_CAPACITY", "512");
        env::set_var("SPIKECORE_DISCARD_LATE_EVENTS", "no");
        env::set_var("SPIKECORE_MAX_EVENTS_PER_TICK", "64");
        env::set_var("SPIKECORE_MULTISYNAPTIC", "YES");

        apply_environment_overrides(&mut options);
        clear_override_vars();

        assert_eq!(options.queue.capacity, 512);
        assert!(!options.queue.discard_late_events);
        assert_eq!(options.queue.max_events_per_tick, Some(64));
        assert!(options.accumulation.multisynaptic);
    }

    #[test]
    fn test_unparseable_env_value_ignored() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut options = CoreOptions::default();

        env::set_var("SPIKECORE_QUEUE_CAPACITY", "lots");
        apply_environment_overrides(&mut options);
        clear_override_vars();

        assert_eq!(options.queue.capacity, 8192);
    }

    #[test]
    fn test_cli_overrides() {
        let mut options = CoreOptions::default();
        options.queue.max_events_per_tick = Some(10);
        let mut cli_args = HashMap::new();
        cli_args.insert("queue_capacity".to_string(), "64".to_string());
        cli_args.insert("max_events_per_tick".to_string(), "none".to_string());

        apply_cli_overrides(&mut options, &cli_args);

        assert_eq!(options.queue.capacity, 64);
        assert_eq!(options.queue.max_events_per_tick, None);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let options_path = dir.path().join(OPTIONS_FILE_NAME);

        let mut file = File::create(&options_path).unwrap();
        writeln!(file, "[queue]").unwrap();
        writeln!(file, "capacity = 128").unwrap();
        writeln!(file, "max_events_per_tick = 8").unwrap();

        env::set_var("SPIKECORE_QUEUE_CAPACITY", "256");
        env::set_var("SPIKECORE_MAX_EVENTS_PER_TICK", "16");

        let mut cli_args = HashMap::new();
        cli_args.insert("queue_capacity".to_string(), "1024".to_string());

        let options = load_options(Some(&options_path), Some(&cli_args)).unwrap();
        clear_override_vars();

        // CLI wins for capacity, env wins for budget (no CLI override)
        assert_eq!(options.queue.capacity, 1024);
        assert_eq!(options.queue.max_events_per_tick, Some(16));
    }

    #[test]
    fn test_overrides_are_validated() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let options_path = dir.path().join(OPTIONS_FILE_NAME);
        File::create(&options_path).unwrap();

        let mut cli_args = HashMap::new();
        cli_args.insert("queue_capacity".to_string(), "0".to_string());

        assert!(matches!(
            load_options(Some(&options_path), Some(&cli_args)),
            Err(LoadError::ValidationError(_))
        ));
    }
}
