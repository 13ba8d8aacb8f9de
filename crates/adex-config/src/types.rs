// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `adex_configuration.toml`. Every section is optional; missing keys take
//! the defaults below.

use adex_dynamics::{
    DriveBlending, InhibitoryAfferent, IntegratorOptions, ModelParameters, NonFinitePolicy,
};
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdexConfig {
    /// Named parameter set, one key per slot of the legacy 28-vector
    pub model: ModelParameters,
    pub regulation: RegulationConfig,
    pub integrator: IntegratorConfig,
    pub stimulus: StimulusConfig,
    pub logging: LoggingConfig,
}

/// Attentional regulation settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegulationConfig {
    /// Initial ψ; 0.5 is the unstable midpoint
    pub psi0: f64,
    pub drive_blending: DriveBlending,
}

impl Default for RegulationConfig {
    fn default() -> Self {
        Self {
            psi0: 0.5,
            drive_blending: DriveBlending::EveryStep,
        }
    }
}

/// Integration and trial settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Base seed; trial `k` of an ensemble uses `seed + k`
    pub seed: u64,
    pub trials: usize,
    pub inhibitory_afferent: InhibitoryAfferent,
    pub non_finite: NonFinitePolicy,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            trials: 1,
            inhibitory_afferent: InhibitoryAfferent::MirrorExcitatory,
            non_finite: NonFinitePolicy::Warn,
        }
    }
}

impl IntegratorConfig {
    pub fn options(&self) -> IntegratorOptions {
        IntegratorOptions {
            inhibitory_afferent: self.inhibitory_afferent,
            non_finite: self.non_finite,
        }
    }
}

/// Rectangular stimulus pair presented to the two pools
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StimulusConfig {
    /// Stimulus A rate while on (Hz)
    pub amplitude_a: f64,
    /// Stimulus B rate while on (Hz)
    pub amplitude_b: f64,
    /// Switch-on time (s)
    pub onset: f64,
    /// Switch-off time (s), inclusive
    pub offset: f64,
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            amplitude_a: 5.0,
            amplitude_b: 4.0,
            onset: 0.0,
            offset: 1.0,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
