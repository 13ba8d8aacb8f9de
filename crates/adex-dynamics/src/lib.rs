// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # AdEx Mean-Field Dynamics
//!
//! Second-order moment-closure model of two competing pools of AdEx
//! neurons, each with a regular-spiking (excitatory) and a fast-spiking
//! (inhibitory) population:
//! - **State**: 18 moments (rates, (co)variances, adaptation)
//! - **Differentiation**: nested centered differences of transfer functions
//! - **Operator**: the drift of the closed moment system
//! - **Regulation**: bistable attentional gate ψ blending the stimuli
//! - **Integrator**: Euler-Maruyama with noise on the four mean rates
//!
//! ```
//! use adex_dynamics::{
//!     drift, AfferentDrive, MeanFieldState, ModelParameters, SigmoidTransferFunction,
//! };
//!
//! let rs = SigmoidTransferFunction::regular_spiking();
//! let fs = SigmoidTransferFunction::fast_spiking();
//! let d = drift(
//!     &MeanFieldState::zeros(),
//!     &rs,
//!     &fs,
//!     &ModelParameters::default(),
//!     &AfferentDrive::default(),
//! );
//! assert!(d.rate_exc_a.is_finite());
//! ```

pub mod differentiation;
pub mod error;
pub mod grid;
pub mod integrator;
pub mod operator;
pub mod params;
pub mod regulatory;
pub mod state;
pub mod transfer;

pub use differentiation::{
    diff2_fe_fe, diff2_fe_fi, diff2_fi_fe, diff2_fi_fi, diff_fe, diff_fi, TransferSensitivity,
    DEFAULT_DF,
};
pub use error::{DynamicsError, Result};
pub use grid::TimeGrid;
pub use integrator::{
    integrate, integrate_with_noise, InhibitoryAfferent, IntegratorOptions, NonFinitePolicy,
    Trajectory, NOISE_COLUMNS,
};
pub use operator::{drift, drift_slice, AfferentDrive};
pub use params::{ModelParameters, PARAMETER_COUNT, PARAMETER_NAMES};
pub use regulatory::{regulate, regulate_with_noise, DriveBlending, RegulatedDrive};
pub use state::{MeanFieldState, StateSlot, MEAN_RATE_SLOTS, STATE_DIM};
pub use transfer::{SigmoidTransferFunction, TransferFunction};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
