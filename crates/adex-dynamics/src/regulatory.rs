// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Reward-Driven Attentional Regulation
//!
//! A bistable gating variable ψ decides how the two raw stimuli are routed
//! to the pools:
//!
//! ```text
//! ψ[i+1] = ψ[i] + (dt/τψ)·(-4ψ[i])(ψ[i] - ½)(ψ[i] - 1)
//!        + √dt · σr · ξ[i] / (τψ · (t[i+1]·c0)²)
//!
//! λA[t] = ψ[t]·SA[t] + (1 - ψ[t])·SB[t]
//! λB[t] = ψ[t]·SB[t] + (1 - ψ[t])·SA[t]
//! ```
//!
//! The double well pulls ψ toward 0 (attend B) or 1 (attend A) and away
//! from ½. The extrinsic noise decays with the square of elapsed time. ψ is
//! not clamped.

use ndarray::Array1;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DynamicsError, Result};
use crate::grid::TimeGrid;
use crate::params::ModelParameters;

/// Which grid points receive a blended drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveBlending {
    /// Blend at every grid point
    #[default]
    EveryStep,
    /// Blend only the first and the last grid point; interior drive stays 0.
    /// This is what the legacy notebook code produced, because its blend
    /// sat after the ψ loop instead of inside it.
    Endpoints,
}

/// Output of the regulatory process, one entry per grid point
#[derive(Debug, Clone, PartialEq)]
pub struct RegulatedDrive {
    pub lambda_a: Array1<f64>,
    pub lambda_b: Array1<f64>,
    pub psi: Array1<f64>,
}

impl RegulatedDrive {
    pub fn len(&self) -> usize {
        self.psi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.psi.is_empty()
    }
}

#[inline]
fn blend(psi: f64, own: f64, other: f64) -> f64 {
    psi * own + (1.0 - psi) * other
}

/// Run the regulatory process with standard-normal draws from `rng`
///
/// Draws exactly `steps` values, one per transition, in time order.
pub fn regulate<G: Rng + ?Sized>(
    psi0: f64,
    stimulus_a: &[f64],
    stimulus_b: &[f64],
    params: &ModelParameters,
    blending: DriveBlending,
    rng: &mut G,
) -> Result<RegulatedDrive> {
    let grid = TimeGrid::from_parameters(params)?;
    let noise: Vec<f64> = (0..grid.steps).map(|_| rng.sample(StandardNormal)).collect();
    regulate_with_noise(psi0, stimulus_a, stimulus_b, params, blending, &noise)
}

/// Run the regulatory process with caller-supplied standard-normal draws
///
/// # Errors
///
/// * `InvalidParameterSet` if `params` fail validation
/// * `ShapeMismatch` if a stimulus is not one entry per grid point or
///   `noise` is not one entry per step
pub fn regulate_with_noise(
    psi0: f64,
    stimulus_a: &[f64],
    stimulus_b: &[f64],
    params: &ModelParameters,
    blending: DriveBlending,
    noise: &[f64],
) -> Result<RegulatedDrive> {
    params.validate()?;
    let grid = TimeGrid::from_parameters(params)?;
    grid.check_len("stimulus A", stimulus_a.len())?;
    grid.check_len("stimulus B", stimulus_b.len())?;
    if noise.len() != grid.steps {
        return Err(DynamicsError::ShapeMismatch {
            what: "regulatory noise",
            expected: grid.steps,
            actual: noise.len(),
        });
    }

    let dt = params.dt;
    let tau_psi = params.tau_psi;
    let times = grid.times();
    let noise_gain = dt.sqrt() * params.sigma_r;

    if grid.steps > 0 {
        let first_kick = noise_gain / (tau_psi * (times[1] * params.c0).powi(2));
        if first_kick.abs() > 1.0 {
            warn!(
                "[REGULATION] First noise kick scale {:.3e} exceeds the well width; \
                 psi will likely diverge (c0={}, dt={})",
                first_kick, params.c0, dt
            );
        }
    }

    let mut psi = Array1::zeros(grid.len());
    psi[0] = psi0;
    for i in 0..grid.steps {
        let p = psi[i];
        let deterministic = (dt / tau_psi) * (-4.0 * p) * (p - 0.5) * (p - 1.0);
        let decay = 1.0 / (times[i + 1] * params.c0).powi(2);
        psi[i + 1] = p + deterministic + decay * noise_gain * noise[i] / tau_psi;
    }

    let mut lambda_a = Array1::zeros(grid.len());
    let mut lambda_b = Array1::zeros(grid.len());
    let blended: Vec<usize> = match blending {
        DriveBlending::EveryStep => (0..grid.len()).collect(),
        DriveBlending::Endpoints => {
            let mut ends = vec![0];
            if grid.steps > 0 {
                ends.push(grid.steps);
            }
            ends
        }
    };
    for k in blended {
        lambda_a[k] = blend(psi[k], stimulus_a[k], stimulus_b[k]);
        lambda_b[k] = blend(psi[k], stimulus_b[k], stimulus_a[k]);
    }

    debug!(
        "[REGULATION] {} steps, psi {:.4} -> {:.4} ({:?})",
        grid.steps, psi0, psi[grid.steps], blending
    );

    Ok(RegulatedDrive {
        lambda_a,
        lambda_b,
        psi,
    })
}
