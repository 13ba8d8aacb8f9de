// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Model Parameters
//!
//! Named form of the 28-slot parameter vector used by legacy tooling. The
//! slot order is a fixed contract:
//!
//! ```text
//!  0 a_rs      7 p_c      14 e_l     21 e_i
//!  1 b_rs      8 n_exc    15 q_e     22 t_final
//!  2 a_fs      9 n_inh    16 q_i     23 dt
//!  3 b_fs     10 v_ai     17 tau_e   24 t_syn
//!  4 tau_w_rs 11 w_ce     18 tau_i   25 tau_psi
//!  5 tau_w_fs 12 w_ci     19 g_l     26 sigma_r
//!  6 n_total  13 sigma    20 e_e     27 c0
//! ```
//!
//! Slots 8 and 9 are carried for interop only; the operator derives the
//! per-pool population sizes from `n_total` and `p_c`. Slots 2, 3 and 5
//! (FS adaptation) are likewise unused because FS cells do not adapt.

use serde::{Deserialize, Serialize};

use crate::error::{DynamicsError, Result};

/// Length of the flat parameter vector
pub const PARAMETER_COUNT: usize = 28;

/// Slot names in flat order
pub const PARAMETER_NAMES: [&str; PARAMETER_COUNT] = [
    "a_rs", "b_rs", "a_fs", "b_fs", "tau_w_rs", "tau_w_fs", "n_total", "p_c", "n_exc", "n_inh",
    "v_ai", "w_ce", "w_ci", "sigma", "e_l", "q_e", "q_i", "tau_e", "tau_i", "g_l", "e_e", "e_i",
    "t_final", "dt", "t_syn", "tau_psi", "sigma_r", "c0",
];

/// Parameters of one simulation run (read-only for its duration)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    /// RS subthreshold adaptation conductance (S)
    pub a_rs: f64,
    /// RS spike-triggered adaptation increment (A)
    pub b_rs: f64,
    pub a_fs: f64,
    pub b_fs: f64,
    /// RS adaptation time constant (s)
    pub tau_w_rs: f64,
    pub tau_w_fs: f64,
    /// Total neuron count across both pools
    pub n_total: f64,
    /// Excitatory fraction
    pub p_c: f64,
    pub n_exc: f64,
    pub n_inh: f64,
    /// Baseline drive keeping each pool in the asynchronous-irregular state (Hz)
    pub v_ai: f64,
    /// Excitatory cross-pool connection weight
    pub w_ce: f64,
    /// Inhibitory cross-pool connection weight
    pub w_ci: f64,
    /// Intrinsic noise amplitude on the mean rates
    pub sigma: f64,
    /// Leak reversal (V)
    pub e_l: f64,
    /// Excitatory quantal conductance (S)
    pub q_e: f64,
    /// Inhibitory quantal conductance (S)
    pub q_i: f64,
    /// Excitatory synaptic decay (s)
    pub tau_e: f64,
    /// Inhibitory synaptic decay (s)
    pub tau_i: f64,
    /// Leak conductance (S)
    pub g_l: f64,
    /// Excitatory reversal (V)
    pub e_e: f64,
    /// Inhibitory reversal (V)
    pub e_i: f64,
    /// Trial length (s)
    pub t_final: f64,
    /// Integration step (s)
    pub dt: f64,
    /// Characteristic time constant of the moment equations (s)
    pub t_syn: f64,
    /// Time scale of the regulatory process (s)
    pub tau_psi: f64,
    /// Extrinsic noise level of the regulatory process
    pub sigma_r: f64,
    /// Decay rate of the extrinsic noise (1/s)
    ///
    /// The first ψ step is scaled by `1/(dt·c0)²`; keep `c0` near `1/dt`
    /// or the first kick throws ψ out of the double well.
    pub c0: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            a_rs: 4e-9,
            b_rs: 20e-12,
            a_fs: 0.0,
            b_fs: 0.0,
            tau_w_rs: 0.5,
            tau_w_fs: 1.0,
            n_total: 10_000.0,
            p_c: 0.8,
            n_exc: 8_000.0,
            n_inh: 2_000.0,
            v_ai: 2.5,
            w_ce: 5e-4,
            w_ci: 2.5e-4,
            sigma: 0.1,
            e_l: -65e-3,
            q_e: 1.5e-9,
            q_i: 5e-9,
            tau_e: 5e-3,
            tau_i: 5e-3,
            g_l: 10e-9,
            e_e: 0.0,
            e_i: -80e-3,
            t_final: 1.0,
            dt: 1e-4,
            t_syn: 5e-3,
            tau_psi: 0.05,
            sigma_r: 0.1,
            c0: 1e4,
        }
    }
}

impl ModelParameters {
    /// Build from the flat legacy vector
    ///
    /// # Errors
    ///
    /// `InvalidParameterSet` if the slice is not 28 long or holds a
    /// non-finite value.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        if values.len() != PARAMETER_COUNT {
            return Err(DynamicsError::InvalidParameterSet(format!(
                "expected {} values, got {}",
                PARAMETER_COUNT,
                values.len()
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(DynamicsError::InvalidParameterSet(format!(
                "{} (slot {}) is not finite: {}",
                PARAMETER_NAMES[i], i, values[i]
            )));
        }

        Ok(Self {
            a_rs: values[0],
            b_rs: values[1],
            a_fs: values[2],
            b_fs: values[3],
            tau_w_rs: values[4],
            tau_w_fs: values[5],
            n_total: values[6],
            p_c: values[7],
            n_exc: values[8],
            n_inh: values[9],
            v_ai: values[10],
            w_ce: values[11],
            w_ci: values[12],
            sigma: values[13],
            e_l: values[14],
            q_e: values[15],
            q_i: values[16],
            tau_e: values[17],
            tau_i: values[18],
            g_l: values[19],
            e_e: values[20],
            e_i: values[21],
            t_final: values[22],
            dt: values[23],
            t_syn: values[24],
            tau_psi: values[25],
            sigma_r: values[26],
            c0: values[27],
        })
    }

    /// Flat legacy form
    pub fn to_array(&self) -> [f64; PARAMETER_COUNT] {
        [
            self.a_rs,
            self.b_rs,
            self.a_fs,
            self.b_fs,
            self.tau_w_rs,
            self.tau_w_fs,
            self.n_total,
            self.p_c,
            self.n_exc,
            self.n_inh,
            self.v_ai,
            self.w_ce,
            self.w_ci,
            self.sigma,
            self.e_l,
            self.q_e,
            self.q_i,
            self.tau_e,
            self.tau_i,
            self.g_l,
            self.e_e,
            self.e_i,
            self.t_final,
            self.dt,
            self.t_syn,
            self.tau_psi,
            self.sigma_r,
            self.c0,
        ]
    }

    /// Check the values the scheme cannot run without
    ///
    /// Physiological ranges are not checked.
    pub fn validate(&self) -> Result<()> {
        let values = self.to_array();
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(DynamicsError::InvalidParameterSet(format!(
                "{} is not finite: {}",
                PARAMETER_NAMES[i], values[i]
            )));
        }
        if self.dt <= 0.0 {
            return Err(DynamicsError::InvalidParameterSet(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if self.t_final < 0.0 {
            return Err(DynamicsError::InvalidParameterSet(format!(
                "t_final must not be negative, got {}",
                self.t_final
            )));
        }
        for (name, value) in [
            ("t_syn", self.t_syn),
            ("tau_w_rs", self.tau_w_rs),
            ("tau_psi", self.tau_psi),
        ] {
            if value == 0.0 {
                return Err(DynamicsError::InvalidParameterSet(format!(
                    "{} must be non-zero",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Total excitatory coupling weight of one pool
    #[inline]
    pub fn w_ce_total(&self) -> f64 {
        self.w_ce * self.p_c * self.n_total / 2.0
    }

    /// Total inhibitory coupling weight of one pool
    #[inline]
    pub fn w_ci_total(&self) -> f64 {
        self.w_ci * self.p_c * self.n_total / 2.0
    }

    /// Excitatory neurons in one pool
    #[inline]
    pub fn n_exc_pool(&self) -> f64 {
        self.n_total * self.p_c / 2.0
    }

    /// Inhibitory neurons in one pool
    #[inline]
    pub fn n_inh_pool(&self) -> f64 {
        self.n_total * (1.0 - self.p_c) / 2.0
    }
}
