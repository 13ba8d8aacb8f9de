// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # adex-meanfield
//!
//! Second-order mean-field simulation of two competing pools of AdEx
//! neurons whose stimuli are routed by a bistable attentional gate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use adex_meanfield::prelude::*;
//!
//! let params = ModelParameters {
//!     t_final: 0.5,
//!     ..ModelParameters::default()
//! };
//! let sim = Simulator::new(
//!     params,
//!     SigmoidTransferFunction::regular_spiking(),
//!     SigmoidTransferFunction::fast_spiking(),
//! );
//!
//! let grid = sim.grid()?;
//! let trial = TrialSpec {
//!     psi0: 0.55,
//!     stimulus_a: step_stimulus(&grid, 5.0, 0.1, 0.4),
//!     stimulus_b: step_stimulus(&grid, 4.0, 0.1, 0.4),
//! };
//!
//! let outcomes = sim.run_ensemble(&trial, 42, 16)?;
//! let (pool_a, pool_b, _) = choice_fractions(&outcomes);
//! println!("A won {:.0}%, B won {:.0}%", pool_a * 100.0, pool_b * 100.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Core: adex-dynamics                                    │
//! │  (operator, regulation, Euler-Maruyama integrator)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: adex-config, adex-observability            │
//! │  (TOML + overrides, tracing setup)                      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Umbrella: simulation                                   │
//! │  (seeded trials, parallel ensembles)                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub mod simulation;

// Re-export the workspace crates
pub use adex_config as config;
pub use adex_dynamics as dynamics;
pub use adex_observability as observability;

pub use simulation::{
    choice_fractions, step_stimulus, Choice, SimulationError, SimulationResult, Simulator,
    TrialOutcome, TrialSpec,
};

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::dynamics::{
        drift, integrate, regulate, AfferentDrive, DriveBlending, DynamicsError,
        InhibitoryAfferent, IntegratorOptions, MeanFieldState, ModelParameters, NonFinitePolicy,
        RegulatedDrive, SigmoidTransferFunction, StateSlot, TimeGrid, Trajectory,
        TransferFunction,
    };

    pub use crate::config::{load_config, validate_config, AdexConfig};

    pub use crate::simulation::{
        choice_fractions, step_stimulus, Choice, SimulationError, Simulator, TrialOutcome,
        TrialSpec,
    };
}
