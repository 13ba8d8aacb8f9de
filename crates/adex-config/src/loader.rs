// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{AdexConfig, ConfigError, ConfigResult};
use adex_dynamics::{DriveBlending, InhibitoryAfferent, NonFinitePolicy};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "adex_configuration.toml";

/// Find the configuration file
///
/// Search order:
/// 1. `ADEX_CONFIG_PATH` environment variable
/// 2. Current working directory: `./adex_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("ADEX_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by ADEX_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet ADEX_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// Validation is left to [`crate::validate_config`].
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AdexConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: AdexConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `ADEX_SEED` -> `integrator.seed`
/// - `ADEX_TRIALS` -> `integrator.trials`
/// - `ADEX_T_FINAL` -> `model.t_final`
/// - `ADEX_DT` -> `model.dt`
/// - `ADEX_SIGMA` -> `model.sigma`
/// - `ADEX_LOG_LEVEL` -> `logging.level`
///
/// Unparseable values are ignored.
pub fn apply_environment_overrides(config: &mut AdexConfig) {
    if let Ok(value) = env::var("ADEX_SEED") {
        if let Ok(seed) = value.parse::<u64>() {
            config.integrator.seed = seed;
        }
    }
    if let Ok(value) = env::var("ADEX_TRIALS") {
        if let Ok(trials) = value.parse::<usize>() {
            config.integrator.trials = trials;
        }
    }

    if let Ok(value) = env::var("ADEX_T_FINAL") {
        if let Ok(t_final) = value.parse::<f64>() {
            config.model.t_final = t_final;
        }
    }
    if let Ok(value) = env::var("ADEX_DT") {
        if let Ok(dt) = value.parse::<f64>() {
            config.model.dt = dt;
        }
    }
    if let Ok(value) = env::var("ADEX_SIGMA") {
        if let Ok(sigma) = value.parse::<f64>() {
            config.model.sigma = sigma;
        }
    }

    if let Ok(value) = env::var("ADEX_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"seed": "7", "dt": "1e-4"}`)
///
/// Recognised keys: `seed`, `trials`, `t_final`, `dt`, `sigma`, `psi0`,
/// `amplitude_a`, `amplitude_b`, `drive_blending`, `inhibitory_afferent`,
/// `non_finite`, `log_level`.
pub fn apply_cli_overrides(config: &mut AdexConfig, cli_args: &HashMap<String, String>) {
    // Integrator settings
    if let Some(value) = cli_args.get("seed") {
        if let Ok(seed) = value.parse::<u64>() {
            config.integrator.seed = seed;
        }
    }
    if let Some(value) = cli_args.get("trials") {
        if let Ok(trials) = value.parse::<usize>() {
            config.integrator.trials = trials;
        }
    }
    if let Some(value) = cli_args.get("inhibitory_afferent") {
        if let Ok(mode) = parse_inhibitory_afferent(value) {
            config.integrator.inhibitory_afferent = mode;
        }
    }
    if let Some(value) = cli_args.get("non_finite") {
        if let Ok(policy) = parse_non_finite_policy(value) {
            config.integrator.non_finite = policy;
        }
    }

    // Model settings
    let model_fields: [(&str, &mut f64); 3] = [
        ("t_final", &mut config.model.t_final),
        ("dt", &mut config.model.dt),
        ("sigma", &mut config.model.sigma),
    ];
    for (key, field) in model_fields {
        if let Some(value) = cli_args.get(key) {
            if let Ok(parsed) = value.parse::<f64>() {
                *field = parsed;
            }
        }
    }

    // Regulation settings
    if let Some(value) = cli_args.get("psi0") {
        if let Ok(psi0) = value.parse::<f64>() {
            config.regulation.psi0 = psi0;
        }
    }
    if let Some(value) = cli_args.get("drive_blending") {
        if let Ok(blending) = parse_drive_blending(value) {
            config.regulation.drive_blending = blending;
        }
    }

    // Stimulus settings
    if let Some(value) = cli_args.get("amplitude_a") {
        if let Ok(amplitude) = value.parse::<f64>() {
            config.stimulus.amplitude_a = amplitude;
        }
    }
    if let Some(value) = cli_args.get("amplitude_b") {
        if let Ok(amplitude) = value.parse::<f64>() {
            config.stimulus.amplitude_b = amplitude;
        }
    }

    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}

/// Parse `mirror_excitatory`, `silent` or `scaled:<factor>`
pub fn parse_inhibitory_afferent(value: &str) -> ConfigResult<InhibitoryAfferent> {
    let lowered = value.trim().to_lowercase();
    match lowered.as_str() {
        "mirror_excitatory" | "mirror" => Ok(InhibitoryAfferent::MirrorExcitatory),
        "silent" | "none" => Ok(InhibitoryAfferent::Silent),
        other => other
            .strip_prefix("scaled:")
            .and_then(|factor| factor.trim().parse::<f64>().ok())
            .map(InhibitoryAfferent::Scaled)
            .ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "inhibitory_afferent '{}' (expected mirror_excitatory, silent or scaled:<factor>)",
                    value
                ))
            }),
    }
}

/// Parse `every_step` or `endpoints`
pub fn parse_drive_blending(value: &str) -> ConfigResult<DriveBlending> {
    match value.trim().to_lowercase().as_str() {
        "every_step" => Ok(DriveBlending::EveryStep),
        "endpoints" => Ok(DriveBlending::Endpoints),
        _ => Err(ConfigError::InvalidValue(format!(
            "drive_blending '{}' (expected every_step or endpoints)",
            value
        ))),
    }
}

/// Parse `ignore`, `warn` or `error`
pub fn parse_non_finite_policy(value: &str) -> ConfigResult<NonFinitePolicy> {
    match value.trim().to_lowercase().as_str() {
        "ignore" => Ok(NonFinitePolicy::Ignore),
        "warn" => Ok(NonFinitePolicy::Warn),
        "error" => Ok(NonFinitePolicy::Error),
        _ => Err(ConfigError::InvalidValue(format!(
            "non_finite '{}' (expected ignore, warn or error)",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 6] = [
        "ADEX_SEED",
        "ADEX_TRIALS",
        "ADEX_T_FINAL",
        "ADEX_DT",
        "ADEX_SIGMA",
        "ADEX_LOG_LEVEL",
    ];

    fn clear_override_vars() -> Vec<(&'static str, String)> {
        let saved = OVERRIDE_VARS
            .iter()
            .filter_map(|name| env::var(name).ok().map(|v| (*name, v)))
            .collect();
        for name in OVERRIDE_VARS {
            env::remove_var(name);
        }
        saved
    }

    fn restore_override_vars(saved: Vec<(&'static str, String)>) {
        for (name, value) in saved {
            env::set_var(name, value);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("ADEX_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("ADEX_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_reported() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        env::set_var("ADEX_CONFIG_PATH", missing.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("ADEX_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved = clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[model]").unwrap();
        writeln!(file, "dt = 0.001").unwrap();
        writeln!(file, "sigma_r = 0.0").unwrap();
        writeln!(file, "[regulation]").unwrap();
        writeln!(file, "drive_blending = \"endpoints\"").unwrap();
        writeln!(file, "[integrator]").unwrap();
        writeln!(file, "inhibitory_afferent = {{ scaled = 0.5 }}").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();
        restore_override_vars(saved);

        assert_eq!(config.model.dt, 0.001);
        assert_eq!(config.model.sigma_r, 0.0);
        // Unlisted keys keep their defaults
        assert_eq!(config.model.t_syn, 5e-3);
        assert_eq!(config.regulation.drive_blending, DriveBlending::Endpoints);
        assert_eq!(config.integrator.inhibitory_afferent, InhibitoryAfferent::Scaled(0.5));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[model").unwrap();

        assert!(matches!(
            load_config(Some(&config_path), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved = clear_override_vars();
        let mut config = AdexConfig::default();

        env::set_var("ADEX_SEED", "1234");
        env::set_var("ADEX_DT", "0.0005");
        env::set_var("ADEX_TRIALS", "not-a-number");

        apply_environment_overrides(&mut config);
        clear_override_vars();
        restore_override_vars(saved);

        assert_eq!(config.integrator.seed, 1234);
        assert_eq!(config.model.dt, 0.0005);
        assert_eq!(config.integrator.trials, 1);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AdexConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("psi0".to_string(), "0.8".to_string());
        cli_args.insert("sigma".to_string(), "0".to_string());
        cli_args.insert("non_finite".to_string(), "error".to_string());
        cli_args.insert("inhibitory_afferent".to_string(), "silent".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.regulation.psi0, 0.8);
        assert_eq!(config.model.sigma, 0.0);
        assert_eq!(config.integrator.non_finite, NonFinitePolicy::Error);
        assert_eq!(config.integrator.inhibitory_afferent, InhibitoryAfferent::Silent);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved = clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[integrator]").unwrap();
        writeln!(file, "seed = 1").unwrap();
        writeln!(file, "trials = 2").unwrap();

        env::set_var("ADEX_SEED", "10");
        env::set_var("ADEX_TRIALS", "20");

        let mut cli_args = HashMap::new();
        cli_args.insert("seed".to_string(), "100".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();
        clear_override_vars();
        restore_override_vars(saved);

        // CLI wins for seed, env wins for trials (no CLI override)
        assert_eq!(config.integrator.seed, 100);
        assert_eq!(config.integrator.trials, 20);
    }

    #[test]
    fn test_parse_inhibitory_afferent() {
        assert_eq!(
            parse_inhibitory_afferent("Mirror_Excitatory").unwrap(),
            InhibitoryAfferent::MirrorExcitatory
        );
        assert_eq!(
            parse_inhibitory_afferent("scaled: 0.25").unwrap(),
            InhibitoryAfferent::Scaled(0.25)
        );
        assert!(matches!(
            parse_inhibitory_afferent("scaled:x"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(parse_drive_blending("sometimes").is_err());
        assert_eq!(parse_non_finite_policy("WARN").unwrap(), NonFinitePolicy::Warn);
    }
}
