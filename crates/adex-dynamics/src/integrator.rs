// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Euler-Maruyama Integration
//!
//! Fixed-step explicit scheme over the shared time grid:
//!
//! ```text
//! X[i+1]        = X[i] + dt · drift(X[i], λA[i], λB[i])
//! X[i+1, slot] += (1/T) · √dt · σ · ξ[i, col]     slot ∈ {0, 1, 7, 8}, col = 0..4
//! ```
//!
//! Only the four mean rates are forced directly; the moments and adaptation
//! variables pick up the noise through the drift at the next step. The
//! `N×4` standard-normal batch is drawn up front, row by row.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{DynamicsError, Result};
use crate::grid::TimeGrid;
use crate::operator::{drift, AfferentDrive};
use crate::params::ModelParameters;
use crate::regulatory::RegulatedDrive;
use crate::state::{MeanFieldState, StateSlot, MEAN_RATE_SLOTS, STATE_DIM};
use crate::transfer::TransferFunction;

/// Number of noise columns (one per mean-rate slot)
pub const NOISE_COLUMNS: usize = MEAN_RATE_SLOTS.len();

/// Inhibitory afferent input derived from each pool's excitatory drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InhibitoryAfferent {
    /// Inhibitory populations receive the same regulated stimulus
    #[default]
    MirrorExcitatory,
    /// Inhibitory populations receive no stimulus
    Silent,
    /// Inhibitory populations receive a scaled copy of the stimulus
    Scaled(f64),
}

impl InhibitoryAfferent {
    #[inline]
    pub fn apply(self, exc: f64) -> f64 {
        match self {
            InhibitoryAfferent::MirrorExcitatory => exc,
            InhibitoryAfferent::Silent => 0.0,
            InhibitoryAfferent::Scaled(gain) => gain * exc,
        }
    }
}

/// Handling of non-finite states; never changes the numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonFinitePolicy {
    /// No checks
    #[default]
    Ignore,
    /// Log the first non-finite step and keep going
    Warn,
    /// Stop with `NonFiniteResult` at the first non-finite step
    Error,
}

/// Integrator configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorOptions {
    pub inhibitory_afferent: InhibitoryAfferent,
    pub non_finite: NonFinitePolicy,
}

/// State trajectory on the time grid (`steps + 1` rows, 18 columns)
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub times: Array1<f64>,
    pub states: Array2<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.states.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.states.nrows() == 0
    }

    /// Named state at grid point `i`
    pub fn state(&self, i: usize) -> Option<MeanFieldState> {
        if i >= self.len() {
            return None;
        }
        let row = self.states.row(i);
        let mut values = [0.0; STATE_DIM];
        for (dst, src) in values.iter_mut().zip(row.iter()) {
            *dst = *src;
        }
        Some(MeanFieldState::from_array(values))
    }

    /// Time course of one slot
    pub fn slot(&self, slot: StateSlot) -> ArrayView1<'_, f64> {
        self.states.column(slot.index())
    }

    pub fn final_state(&self) -> MeanFieldState {
        // At least the initial row is always present
        self.state(self.len() - 1).unwrap_or_default()
    }
}

/// Integrate with a freshly drawn `steps × 4` standard-normal batch
pub fn integrate<R, F, G>(
    x0: &MeanFieldState,
    drive: &RegulatedDrive,
    rs: &R,
    fs: &F,
    params: &ModelParameters,
    options: &IntegratorOptions,
    rng: &mut G,
) -> Result<Trajectory>
where
    R: TransferFunction + ?Sized,
    F: TransferFunction + ?Sized,
    G: Rng + ?Sized,
{
    let grid = TimeGrid::from_parameters(params)?;
    let noise = Array2::from_shape_fn((grid.steps, NOISE_COLUMNS), |_| {
        rng.sample::<f64, _>(StandardNormal)
    });
    integrate_with_noise(x0, drive, rs, fs, params, options, noise.view())
}

/// Integrate with caller-supplied intrinsic noise
///
/// `noise` row `i` forces step `i`; columns 0-1 go to pool A's rates,
/// columns 2-3 to pool B's.
///
/// # Errors
///
/// * `InvalidParameterSet` if `params` fail validation
/// * `ShapeMismatch` if the drive or the noise does not fit the grid
/// * `NonFiniteResult` only with [`NonFinitePolicy::Error`]
pub fn integrate_with_noise<R, F>(
    x0: &MeanFieldState,
    drive: &RegulatedDrive,
    rs: &R,
    fs: &F,
    params: &ModelParameters,
    options: &IntegratorOptions,
    noise: ArrayView2<'_, f64>,
) -> Result<Trajectory>
where
    R: TransferFunction + ?Sized,
    F: TransferFunction + ?Sized,
{
    params.validate()?;
    let grid = TimeGrid::from_parameters(params)?;
    grid.check_len("drive lambda A", drive.lambda_a.len())?;
    grid.check_len("drive lambda B", drive.lambda_b.len())?;
    if noise.nrows() != grid.steps {
        return Err(DynamicsError::ShapeMismatch {
            what: "intrinsic noise rows",
            expected: grid.steps,
            actual: noise.nrows(),
        });
    }
    if noise.ncols() != NOISE_COLUMNS {
        return Err(DynamicsError::ShapeMismatch {
            what: "intrinsic noise columns",
            expected: NOISE_COLUMNS,
            actual: noise.ncols(),
        });
    }

    let dt = params.dt;
    let noise_gain = (1.0 / params.t_syn) * dt.sqrt() * params.sigma;
    let progress_every = (grid.steps / 10).max(1);

    debug!(
        "[EULER-MARUYAMA] Integrating {} steps (dt={}, sigma={}, inh afferent {:?})",
        grid.steps, dt, params.sigma, options.inhibitory_afferent
    );

    let mut states = Array2::zeros((grid.len(), STATE_DIM));
    for (dst, src) in states.row_mut(0).iter_mut().zip(x0.to_array()) {
        *dst = src;
    }

    let mut current = *x0;
    let mut warned = false;
    for i in 0..grid.steps {
        let exc_a = drive.lambda_a[i];
        let exc_b = drive.lambda_b[i];
        let afferent = AfferentDrive::new(
            exc_a,
            exc_b,
            options.inhibitory_afferent.apply(exc_a),
            options.inhibitory_afferent.apply(exc_b),
        );

        let derivative = drift(&current, rs, fs, params, &afferent).to_array();
        let mut next = current.to_array();
        for (x, dx) in next.iter_mut().zip(derivative) {
            *x += dt * dx;
        }
        for (col, slot) in MEAN_RATE_SLOTS.iter().enumerate() {
            next[slot.index()] += noise_gain * noise[[i, col]];
        }

        for (dst, src) in states.row_mut(i + 1).iter_mut().zip(next) {
            *dst = src;
        }
        current = MeanFieldState::from_array(next);

        if options.non_finite != NonFinitePolicy::Ignore {
            if let Some(slot) = current.first_non_finite() {
                match options.non_finite {
                    NonFinitePolicy::Error => {
                        return Err(DynamicsError::NonFiniteResult { step: i + 1, slot });
                    }
                    _ if !warned => {
                        warn!(
                            "[EULER-MARUYAMA] Non-finite {} at step {} (t={:.6})",
                            slot,
                            i + 1,
                            (i + 1) as f64 * dt
                        );
                        warned = true;
                    }
                    _ => {}
                }
            }
        }

        if (i + 1) % progress_every == 0 {
            trace!(
                "[EULER-MARUYAMA] step {}/{}: v_eA={:.4} v_eB={:.4}",
                i + 1,
                grid.steps,
                current.rate_exc_a,
                current.rate_exc_b
            );
        }
    }

    debug!(
        "[EULER-MARUYAMA] Done: v_eA={:.4} v_eB={:.4}",
        current.rate_exc_a, current.rate_exc_b
    );

    Ok(Trajectory {
        times: grid.times(),
        states,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn zero_tf(_fe: f64, _fi: f64, _w: f64) -> f64 {
        0.0
    }

    fn short_params() -> ModelParameters {
        ModelParameters {
            t_final: 1.0,
            dt: 0.1,
            a_rs: 0.0,
            b_rs: 0.0,
            ..ModelParameters::default()
        }
    }

    fn flat_drive(len: usize, a: f64, b: f64) -> RegulatedDrive {
        RegulatedDrive {
            lambda_a: Array1::from_elem(len, a),
            lambda_b: Array1::from_elem(len, b),
            psi: Array1::from_elem(len, 0.5),
        }
    }

    #[test]
    fn test_noise_reaches_only_mean_rate_slots() {
        let params = short_params();
        let mut noise = Array2::zeros((10, NOISE_COLUMNS));
        noise[[0, 0]] = 1.0;
        noise[[0, 1]] = 2.0;
        noise[[0, 2]] = 3.0;
        noise[[0, 3]] = 4.0;

        let traj = integrate_with_noise(
            &MeanFieldState::zeros(),
            &flat_drive(11, 0.0, 0.0),
            &zero_tf,
            &zero_tf,
            &params,
            &IntegratorOptions::default(),
            noise.view(),
        )
        .unwrap();

        let gain = (1.0 / params.t_syn) * params.dt.sqrt() * params.sigma;
        let step1 = traj.state(1).unwrap();
        assert_eq!(step1.rate_exc_a, gain);
        assert_eq!(step1.rate_inh_a, 2.0 * gain);
        assert_eq!(step1.rate_exc_b, 3.0 * gain);
        assert_eq!(step1.rate_inh_b, 4.0 * gain);
        for slot in StateSlot::ALL {
            if !MEAN_RATE_SLOTS.contains(&slot) {
                assert_eq!(step1.get(slot), 0.0, "{} was forced", slot);
            }
        }
    }

    #[test]
    fn test_inhibitory_afferent_modes() {
        assert_eq!(InhibitoryAfferent::MirrorExcitatory.apply(3.0), 3.0);
        assert_eq!(InhibitoryAfferent::Silent.apply(3.0), 0.0);
        assert_eq!(InhibitoryAfferent::Scaled(0.5).apply(3.0), 1.5);
    }

    #[test]
    fn test_inhibitory_afferent_changes_inhibitory_input() {
        let params = ModelParameters {
            sigma: 0.0,
            ..short_params()
        };
        // RS output reads the inhibitory input directly
        let tf = |_fe: f64, fi: f64, _w: f64| fi;
        let noise = Array2::zeros((10, NOISE_COLUMNS));
        let drive = flat_drive(11, 4.0, 0.0);

        let run = |mode| {
            let options = IntegratorOptions {
                inhibitory_afferent: mode,
                ..IntegratorOptions::default()
            };
            integrate_with_noise(
                &MeanFieldState::zeros(),
                &drive,
                &tf,
                &zero_tf,
                &params,
                &options,
                noise.view(),
            )
            .unwrap()
        };

        let mirrored = run(InhibitoryAfferent::MirrorExcitatory).state(1).unwrap();
        let silent = run(InhibitoryAfferent::Silent).state(1).unwrap();
        assert!(mirrored.rate_exc_a > silent.rate_exc_a);
        assert!((mirrored.rate_exc_a - silent.rate_exc_a - params.dt * 4.0 / params.t_syn).abs() < 1e-6);
    }

    #[test]
    fn test_trajectory_shape_and_times() {
        let params = short_params();
        let noise = Array2::zeros((10, NOISE_COLUMNS));
        let traj = integrate_with_noise(
            &MeanFieldState::zeros(),
            &flat_drive(11, 0.0, 0.0),
            &zero_tf,
            &zero_tf,
            &params,
            &IntegratorOptions::default(),
            noise.view(),
        )
        .unwrap();

        assert_eq!(traj.len(), 11);
        assert_eq!(traj.states.ncols(), STATE_DIM);
        assert_eq!(traj.times.len(), 11);
        assert_eq!(traj.slot(StateSlot::RateExcB).len(), 11);
        assert!(traj.state(11).is_none());
    }

    #[test]
    fn test_drive_length_mismatch() {
        let params = short_params();
        let noise = Array2::zeros((10, NOISE_COLUMNS));
        let err = integrate_with_noise(
            &MeanFieldState::zeros(),
            &flat_drive(10, 0.0, 0.0),
            &zero_tf,
            &zero_tf,
            &params,
            &IntegratorOptions::default(),
            noise.view(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DynamicsError::ShapeMismatch {
                expected: 11,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_noise_shape_mismatch() {
        let params = short_params();
        let noise = Array2::zeros((10, 3));
        let err = integrate_with_noise(
            &MeanFieldState::zeros(),
            &flat_drive(11, 0.0, 0.0),
            &zero_tf,
            &zero_tf,
            &params,
            &IntegratorOptions::default(),
            noise.view(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DynamicsError::ShapeMismatch {
                what: "intrinsic noise columns",
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_non_finite_policy_does_not_change_numbers() {
        let params = short_params();
        let tf = |fe: f64, _fi: f64, _w: f64| if fe > 1e3 { f64::INFINITY } else { fe };
        let noise = Array2::zeros((10, NOISE_COLUMNS));
        let drive = flat_drive(11, 5e3, 0.0);

        let run = |non_finite| {
            let options = IntegratorOptions {
                non_finite,
                ..IntegratorOptions::default()
            };
            integrate_with_noise(
                &MeanFieldState::zeros(),
                &drive,
                &tf,
                &tf,
                &params,
                &options,
                noise.view(),
            )
        };

        let ignored = run(NonFinitePolicy::Ignore).unwrap();
        let warned = run(NonFinitePolicy::Warn).unwrap();
        assert_eq!(
            ignored.states.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            warned.states.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
        assert!(ignored.final_state().first_non_finite().is_some());

        match run(NonFinitePolicy::Error) {
            Err(DynamicsError::NonFiniteResult { step, .. }) => assert_eq!(step, 1),
            other => panic!("expected NonFiniteResult, got {:?}", other),
        }
    }
}
