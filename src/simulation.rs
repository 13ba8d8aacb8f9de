// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Trial and Ensemble Runner
//!
//! A trial is one regulated drive followed by one integration, both fed
//! from a single `StdRng` seeded per trial: the `steps` ψ draws come first,
//! then the `steps × 4` intrinsic batch. Ensembles run trials in parallel
//! with rayon; trial `k` uses seed `base_seed + k`, so an ensemble equals
//! the same trials run one by one.

use adex_config::{validate_config, AdexConfig, ConfigError};
use adex_dynamics::{
    integrate, regulate, DriveBlending, DynamicsError, IntegratorOptions, MeanFieldState,
    ModelParameters, RegulatedDrive, StateSlot, TimeGrid, Trajectory, TransferFunction,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info};

/// Simulation error types
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Dynamics(#[from] DynamicsError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type SimulationResult<T> = Result<T, SimulationError>;

/// Inputs of one trial
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSpec {
    pub psi0: f64,
    /// Raw stimulus A, one entry per grid point
    pub stimulus_a: Vec<f64>,
    /// Raw stimulus B, one entry per grid point
    pub stimulus_b: Vec<f64>,
}

impl TrialSpec {
    /// Rectangular stimuli and ψ0 from the `[stimulus]` and `[regulation]` sections
    pub fn from_config(config: &AdexConfig) -> SimulationResult<Self> {
        let grid = TimeGrid::from_parameters(&config.model)?;
        let stimulus = &config.stimulus;
        Ok(Self {
            psi0: config.regulation.psi0,
            stimulus_a: step_stimulus(&grid, stimulus.amplitude_a, stimulus.onset, stimulus.offset),
            stimulus_b: step_stimulus(&grid, stimulus.amplitude_b, stimulus.onset, stimulus.offset),
        })
    }
}

/// Result of one trial
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub drive: RegulatedDrive,
    pub trajectory: Trajectory,
    pub seed: u64,
}

/// Pool whose excitatory rate ends higher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    PoolA,
    PoolB,
    /// Equal, or a non-finite final rate
    Undecided,
}

impl TrialOutcome {
    pub fn choice(&self) -> Choice {
        let last = self.trajectory.final_state();
        let (a, b) = (last.rate_exc_a, last.rate_exc_b);
        if !(a.is_finite() && b.is_finite()) || a == b {
            Choice::Undecided
        } else if a > b {
            Choice::PoolA
        } else {
            Choice::PoolB
        }
    }

    /// Final value of the attentional gate
    pub fn final_psi(&self) -> f64 {
        self.drive.psi[self.drive.psi.len() - 1]
    }

    pub fn final_rate(&self, slot: StateSlot) -> f64 {
        self.trajectory.final_state().get(slot)
    }
}

/// Rectangular trace: `amplitude` on `[onset, offset]`, 0 elsewhere
pub fn step_stimulus(grid: &TimeGrid, amplitude: f64, onset: f64, offset: f64) -> Vec<f64> {
    grid.times()
        .iter()
        .map(|&t| if t >= onset && t <= offset { amplitude } else { 0.0 })
        .collect()
}

/// Trial runner for one parameter set and one pair of transfer functions
#[derive(Debug, Clone)]
pub struct Simulator<R, F> {
    params: ModelParameters,
    rs: R,
    fs: F,
    options: IntegratorOptions,
    blending: DriveBlending,
    initial_state: MeanFieldState,
}

impl<R, F> Simulator<R, F>
where
    R: TransferFunction,
    F: TransferFunction,
{
    /// Defaults: mirrored inhibitory afferent, every-step blending, zero initial state
    pub fn new(params: ModelParameters, rs: R, fs: F) -> Self {
        Self {
            params,
            rs,
            fs,
            options: IntegratorOptions::default(),
            blending: DriveBlending::default(),
            initial_state: MeanFieldState::zeros(),
        }
    }

    /// Build from a validated configuration
    ///
    /// # Errors
    ///
    /// `SimulationError::Config` listing every validation problem.
    pub fn from_config(config: &AdexConfig, rs: R, fs: F) -> SimulationResult<Self> {
        validate_config(config)?;
        Ok(Self::new(config.model, rs, fs)
            .with_options(config.integrator.options())
            .with_blending(config.regulation.drive_blending))
    }

    pub fn with_options(mut self, options: IntegratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_blending(mut self, blending: DriveBlending) -> Self {
        self.blending = blending;
        self
    }

    pub fn with_initial_state(mut self, state: MeanFieldState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    pub fn grid(&self) -> SimulationResult<TimeGrid> {
        Ok(TimeGrid::from_parameters(&self.params)?)
    }

    /// Regulate, then integrate, from one seeded RNG
    pub fn run_trial(&self, trial: &TrialSpec, seed: u64) -> SimulationResult<TrialOutcome> {
        let mut rng = StdRng::seed_from_u64(seed);
        let drive = regulate(
            trial.psi0,
            &trial.stimulus_a,
            &trial.stimulus_b,
            &self.params,
            self.blending,
            &mut rng,
        )?;
        let trajectory = integrate(
            &self.initial_state,
            &drive,
            &self.rs,
            &self.fs,
            &self.params,
            &self.options,
            &mut rng,
        )?;
        debug!(
            "[TRIAL] seed {}: psi {:.3}, v_eA {:.3}, v_eB {:.3}",
            seed,
            drive.psi[drive.len() - 1],
            trajectory.final_state().rate_exc_a,
            trajectory.final_state().rate_exc_b
        );
        Ok(TrialOutcome {
            drive,
            trajectory,
            seed,
        })
    }
}

impl<R, F> Simulator<R, F>
where
    R: TransferFunction + Sync,
    F: TransferFunction + Sync,
{
    /// Independent trials in parallel, ordered by trial index
    ///
    /// Stops at the first failing trial.
    pub fn run_ensemble(
        &self,
        trial: &TrialSpec,
        base_seed: u64,
        trials: usize,
    ) -> SimulationResult<Vec<TrialOutcome>> {
        info!(
            "[ENSEMBLE] {} trials from seed {} on {} threads",
            trials,
            base_seed,
            rayon::current_num_threads()
        );
        (0..trials)
            .into_par_iter()
            .map(|k| self.run_trial(trial, base_seed.wrapping_add(k as u64)))
            .collect()
    }
}

/// Fraction of trials won by each pool: `(pool A, pool B, undecided)`
pub fn choice_fractions(outcomes: &[TrialOutcome]) -> (f64, f64, f64) {
    if outcomes.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let n = outcomes.len() as f64;
    let count = |choice: Choice| outcomes.iter().filter(|o| o.choice() == choice).count() as f64 / n;
    (count(Choice::PoolA), count(Choice::PoolB), count(Choice::Undecided))
}
