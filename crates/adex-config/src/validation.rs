// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Collects every problem in one pass so a user fixes the file once.

use crate::{AdexConfig, ConfigError, ConfigResult};
use adex_dynamics::InhibitoryAfferent;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    InvalidModel { reason: String },
    InvalidValue { field: String, reason: String },
    InvalidWindow { onset: f64, offset: f64 },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidModel { reason } => write!(f, "Invalid model parameters: {}", reason),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::InvalidWindow { onset, offset } => write!(
                f,
                "Stimulus window is empty: onset {} is after offset {}",
                onset, offset
            ),
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - A model parameter set the integrator accepts
/// - Finite ψ0, stimulus amplitudes and window, with onset <= offset
/// - At least one trial and a finite inhibitory scaling factor
/// - A known log level
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &AdexConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    if let Err(e) = config.model.validate() {
        errors.push(ConfigValidationError::InvalidModel {
            reason: e.to_string(),
        });
    }
    validate_regulation(config, &mut errors);
    validate_integrator(config, &mut errors);
    validate_stimulus(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn require_finite(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !value.is_finite() {
        errors.push(ConfigValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("must be finite, got {}", value),
        });
    }
}

fn validate_regulation(config: &AdexConfig, errors: &mut Vec<ConfigValidationError>) {
    // ψ is not clamped, so any finite start is accepted
    require_finite("regulation.psi0", config.regulation.psi0, errors);
}

fn validate_integrator(config: &AdexConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.integrator.trials == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "integrator.trials".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if let InhibitoryAfferent::Scaled(factor) = config.integrator.inhibitory_afferent {
        require_finite("integrator.inhibitory_afferent.scaled", factor, errors);
    }
}

fn validate_stimulus(config: &AdexConfig, errors: &mut Vec<ConfigValidationError>) {
    let stimulus = &config.stimulus;
    require_finite("stimulus.amplitude_a", stimulus.amplitude_a, errors);
    require_finite("stimulus.amplitude_b", stimulus.amplitude_b, errors);
    require_finite("stimulus.onset", stimulus.onset, errors);
    require_finite("stimulus.offset", stimulus.offset, errors);

    if stimulus.onset > stimulus.offset {
        errors.push(ConfigValidationError::InvalidWindow {
            onset: stimulus.onset,
            offset: stimulus.offset,
        });
    }
}

fn validate_logging(config: &AdexConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AdexConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_model_is_reported() {
        let mut config = AdexConfig::default();
        config.model.dt = 0.0;

        match validate_config(&config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("Invalid model parameters"));
                assert!(msg.contains("dt"));
            }
            other => panic!("expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_all_problems_are_collected() {
        let mut config = AdexConfig::default();
        config.regulation.psi0 = f64::NAN;
        config.integrator.trials = 0;
        config.stimulus.onset = 0.8;
        config.stimulus.offset = 0.2;
        config.logging.level = "verbose".to_string();

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("regulation.psi0"));
            assert!(msg.contains("integrator.trials"));
            assert!(msg.contains("onset 0.8 is after offset 0.2"));
            assert!(msg.contains("logging.level"));
            assert_eq!(msg.lines().count(), 5);
        } else {
            panic!("expected ValidationError");
        }
    }

    #[test]
    fn test_psi0_outside_unit_interval_is_accepted() {
        let mut config = AdexConfig::default();
        config.regulation.psi0 = 1.3;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_scaled_afferent_must_be_finite() {
        let mut config = AdexConfig::default();
        config.integrator.inhibitory_afferent = InhibitoryAfferent::Scaled(f64::INFINITY);
        assert!(validate_config(&config).is_err());

        config.integrator.inhibitory_afferent = InhibitoryAfferent::Scaled(0.0);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let mut config = AdexConfig::default();
        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
