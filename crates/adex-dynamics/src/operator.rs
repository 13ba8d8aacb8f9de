// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Moment-Closure Differential Operator
//!
//! Drift of the 18-dimensional second-order mean-field system of two pools
//! (A and B), each with an RS (excitatory) and an FS (inhibitory)
//! population.
//!
//! ## Inputs seen by each pool
//!
//! ```text
//! cross_e(A) = (v_eB + exc_aff_B + v_ai) * wCe      cross_i(A) = (v_eB + exc_aff_B + v_ai) * wCi
//! exc_in(A)  = v_eA + v_ai + exc_aff_A + cross_e(A)
//! inh_in(A)  = v_iA + inh_aff_A + cross_i(A)
//! ```
//!
//! and symmetrically for B. RS and FS cells of a pool see the same inputs;
//! RS evaluates TF1 at `W_e`, FS evaluates TF2 at `W_i`.
//!
//! ## Equations
//!
//! Mean rates: `T·dν/dt = TF + ½ Σ C·∂²TF + (cross-pool curvature terms) - ν`.
//! Second moments: `T·dC/dt = (finite-size term) + (TF_μ - ν_μ)(TF_λ - ν_λ)
//! + Σ C·∂TF - 2C`. Adaptation: `dW/dt = -W/τw + b·ν_e + a(μV - El)/τw`.
//! FS adaptation relaxes to zero with unit rate.
//!
//! The result propagates NaN and infinity from the transfer functions
//! unmasked.

use crate::differentiation::{diff_fi, TransferSensitivity, DEFAULT_DF};
use crate::error::Result;
use crate::params::ModelParameters;
use crate::state::{MeanFieldState, STATE_DIM};
use crate::transfer::TransferFunction;

/// Stimulus-related afferent input rates of one time step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AfferentDrive {
    pub exc_a: f64,
    pub exc_b: f64,
    pub inh_a: f64,
    pub inh_b: f64,
}

impl AfferentDrive {
    pub fn new(exc_a: f64, exc_b: f64, inh_a: f64, inh_b: f64) -> Self {
        Self {
            exc_a,
            exc_b,
            inh_a,
            inh_b,
        }
    }
}

/// Effective (excitatory, inhibitory) input of one pool
#[derive(Debug, Clone, Copy)]
struct PoolInput {
    exc: f64,
    inh: f64,
}

/// Mean conductance-based membrane potential of one pool's RS cells
fn mean_membrane_potential(
    params: &ModelParameters,
    fe: f64,
    fi: f64,
    adaptation: f64,
) -> f64 {
    let mu_ge = params.q_e * params.tau_e * fe;
    let mu_gi = params.q_i * params.tau_i * fi;
    let mu_g = params.g_l + mu_ge + mu_gi;
    (mu_ge * params.e_e + mu_gi * params.e_i + params.g_l * params.e_l - adaptation) / mu_g
}

/// Evaluate the drift vector
///
/// Pure: no hidden state, `state` is not modified.
///
/// # Arguments
/// * `state` - Current moments
/// * `rs` - TF1, regular-spiking (excitatory) transfer function
/// * `fs` - TF2, fast-spiking (inhibitory) transfer function
/// * `params` - Model parameters
/// * `drive` - Afferent inputs of this step
pub fn drift<R, F>(
    state: &MeanFieldState,
    rs: &R,
    fs: &F,
    params: &ModelParameters,
    drive: &AfferentDrive,
) -> MeanFieldState
where
    R: TransferFunction + ?Sized,
    F: TransferFunction + ?Sized,
{
    let x = state;
    let t = params.t_syn;
    let v_ai = params.v_ai;
    let wce = params.w_ce_total();
    let wci = params.w_ci_total();
    let ne = params.n_exc_pool();
    let ni = params.n_inh_pool();
    let df = DEFAULT_DF;

    // Lateral excitation from the opposite pool's RS population
    let drive_from_b = x.rate_exc_b + drive.exc_b + v_ai;
    let drive_from_a = x.rate_exc_a + drive.exc_a + v_ai;

    let input_a = PoolInput {
        exc: x.rate_exc_a + v_ai + drive.exc_a + drive_from_b * wce,
        inh: x.rate_inh_a + drive.inh_a + drive_from_b * wci,
    };
    let input_b = PoolInput {
        exc: x.rate_exc_b + v_ai + drive.exc_b + drive_from_a * wce,
        inh: x.rate_inh_b + drive.inh_b + drive_from_a * wci,
    };

    let rs_a = TransferSensitivity::evaluate(rs, input_a.exc, input_a.inh, x.adapt_exc_a, df);
    let fs_a = TransferSensitivity::evaluate(fs, input_a.exc, input_a.inh, x.adapt_inh_a, df);
    let rs_b = TransferSensitivity::evaluate(rs, input_b.exc, input_b.inh, x.adapt_exc_b, df);
    let fs_b = TransferSensitivity::evaluate(fs, input_b.exc, input_b.inh, x.adapt_inh_b, df);

    // The C_iA* cross-pool equations take this FS slope at the RS adaptation level
    let fs_a_d_fi_at_w_exc = diff_fi(fs, input_a.exc, input_a.inh, x.adapt_exc_a, df);

    // Mean rates, pool A: own second moments, then the B-side terms
    let mean_rate_a = |s: &TransferSensitivity, rate: f64| {
        1.0 / t
            * (0.5 * x.var_exc_exc_a * s.d2_fe_fe
                + 0.5 * x.cov_exc_inh_a * s.d2_fe_fi
                + 0.5 * x.cov_exc_inh_a * s.d2_fi_fe
                + 0.5 * x.var_inh_inh_a * s.d2_fi_fi
                + x.cov_exc_a_exc_b * (s.d2_fe_fe * wce + s.d2_fe_fi * wci)
                + x.cov_inh_a_exc_b * (s.d2_fe_fi * wce + s.d2_fi_fi * wci)
                + 0.5
                    * x.var_exc_exc_b
                    * (s.d2_fe_fe * wce.powi(2)
                        + s.d2_fi_fi * wci.powi(2)
                        + 2.0 * s.d2_fe_fi * wci * wce)
                + s.value
                - rate)
    };

    let mean_rate_b = |s: &TransferSensitivity, rate: f64| {
        1.0 / t
            * (0.5 * x.var_exc_exc_b * s.d2_fe_fe
                + 0.5 * x.cov_exc_inh_b * s.d2_fe_fi
                + 0.5 * x.cov_exc_inh_b * s.d2_fi_fe
                + 0.5 * x.var_inh_inh_b * s.d2_fi_fi
                + 0.5
                    * x.var_exc_exc_a
                    * (s.d2_fe_fe * wce.powi(2)
                        + s.d2_fi_fi * wci.powi(2)
                        + 2.0 * s.d2_fe_fi * wce * wci)
                + x.cov_exc_a_exc_b * (s.d2_fe_fe * wce + s.d2_fe_fi * wci)
                + x.cov_exc_a_inh_b * (s.d2_fe_fi * wce + s.d2_fi_fi * wci)
                + s.value
                - rate)
    };

    // Variance of one population: finite-size term + mismatch + linear response
    let variance = |s: &TransferSensitivity,
                    n: f64,
                    rate: f64,
                    c_on_fe: f64,
                    c_on_fi: f64,
                    c_cross: f64,
                    c_self: f64| {
        1.0 / t
            * (1.0 / n * s.value * (1.0 / t - s.value)
                + (s.value - rate).powi(2)
                + 2.0 * c_on_fe * s.d_fe
                + 2.0 * c_on_fi * s.d_fi
                + 2.0 * c_cross * (s.d_fe * wce + s.d_fi * wci)
                - 2.0 * c_self)
    };

    // Within-pool exc/inh covariance
    let covariance = |e: &TransferSensitivity,
                      i: &TransferSensitivity,
                      rate_e: f64,
                      rate_i: f64,
                      c_ee: f64,
                      c_ei: f64,
                      c_ii: f64,
                      c_cross_on_e: f64,
                      c_cross_on_i: f64| {
        1.0 / t
            * ((e.value - rate_e) * (i.value - rate_i)
                + c_ee * i.d_fe
                + c_ei * e.d_fe
                + c_ei * i.d_fi
                + c_ii * e.d_fi
                + c_cross_on_e * (e.d_fe * wce + e.d_fi * wci)
                + c_cross_on_i * (i.d_fe * wce + i.d_fi * wci)
                - 2.0 * c_ei)
    };

    // Adaptation of a pool's RS cells, driven by its own and the opposite pool's rates
    let adaptation = |rate_e_own: f64,
                      aff_own: f64,
                      rate_i_own: f64,
                      rate_e_other: f64,
                      aff_other: f64,
                      w: f64| {
        let fe = 2.0 * params.w_ce * ne * (rate_e_own + v_ai + aff_own)
            + params.w_ce * ne * (rate_e_other + v_ai + aff_other);
        let fi = 2.0 * params.w_ci * ni * rate_i_own
            + params.w_ci * ne * (rate_e_other + v_ai + aff_other);
        let mu_v = mean_membrane_potential(params, fe, fi, w);
        -w / params.tau_w_rs + params.b_rs * rate_e_own + params.a_rs * (mu_v - params.e_l) / params.tau_w_rs
    };

    let cov_exc_a_exc_b = 1.0 / t
        * ((rs_a.value - x.rate_exc_a) * (rs_b.value - x.rate_exc_b)
            + x.cov_exc_a_exc_b * rs_a.d_fe
            + x.cov_inh_a_exc_b * rs_a.d_fi
            + x.var_exc_exc_b * (rs_a.d_fe * wce + rs_a.d_fi * wci)
            + x.var_exc_exc_a * (rs_b.d_fe * wce + rs_b.d_fi * wci)
            + x.cov_exc_a_exc_b * rs_b.d_fe
            + x.cov_exc_a_inh_b * rs_b.d_fi
            - 2.0 * x.cov_exc_a_exc_b);

    let cov_exc_a_inh_b = 1.0 / t
        * ((rs_a.value - x.rate_exc_a) * (fs_b.value - x.rate_inh_b)
            + x.cov_exc_a_inh_b * rs_a.d_fe
            + x.cov_inh_a_inh_b * rs_a.d_fi
            + x.cov_exc_inh_b * (rs_a.d_fe * wce + rs_a.d_fi * wci)
            + x.var_exc_exc_a * (fs_b.d_fe * wce + fs_b.d_fi * wci)
            + x.cov_exc_a_exc_b * fs_b.d_fe
            + x.cov_exc_a_inh_b * fs_b.d_fi
            - 2.0 * x.cov_exc_a_inh_b);

    let cov_inh_a_exc_b = 1.0 / t
        * ((fs_a.value - x.rate_inh_a) * (rs_b.value - x.rate_exc_b)
            + x.cov_exc_a_exc_b * fs_a.d_fe
            + x.cov_inh_a_exc_b * fs_a.d_fi
            + x.var_exc_exc_b * (fs_a.d_fe * wce + fs_a_d_fi_at_w_exc * wci)
            + x.cov_exc_inh_a * (rs_b.d_fe * wce + fs_b.d_fi * wci)
            + x.cov_inh_a_exc_b * rs_b.d_fe
            + x.cov_inh_a_inh_b * fs_b.d_fi
            - 2.0 * x.cov_inh_a_exc_b);

    let cov_inh_a_inh_b = 1.0 / t
        * ((fs_a.value - x.rate_inh_a) * (fs_b.value - x.rate_inh_b)
            + x.cov_exc_a_inh_b * fs_a.d_fe
            + x.cov_inh_a_inh_b * fs_a.d_fi
            + x.cov_exc_inh_b * (fs_a.d_fe * wce + fs_a_d_fi_at_w_exc * wci)
            + x.cov_exc_inh_a * (fs_b.d_fe * wce + fs_b.d_fi * wci)
            + x.cov_inh_a_exc_b * fs_b.d_fe
            + x.cov_inh_a_inh_b * fs_b.d_fi
            - 2.0 * x.cov_inh_a_inh_b);

    MeanFieldState {
        rate_exc_a: mean_rate_a(&rs_a, x.rate_exc_a),
        rate_inh_a: mean_rate_a(&fs_a, x.rate_inh_a),
        var_exc_exc_a: variance(
            &rs_a,
            ne,
            x.rate_exc_a,
            x.var_exc_exc_a,
            x.cov_exc_inh_a,
            x.cov_exc_a_exc_b,
            x.var_exc_exc_a,
        ),
        cov_exc_inh_a: covariance(
            &rs_a,
            &fs_a,
            x.rate_exc_a,
            x.rate_inh_a,
            x.var_exc_exc_a,
            x.cov_exc_inh_a,
            x.var_inh_inh_a,
            x.cov_inh_a_exc_b,
            x.cov_exc_a_exc_b,
        ),
        var_inh_inh_a: variance(
            &fs_a,
            ni,
            x.rate_inh_a,
            x.cov_exc_inh_a,
            x.var_inh_inh_a,
            x.cov_inh_a_exc_b,
            x.var_inh_inh_a,
        ),
        adapt_exc_a: adaptation(
            x.rate_exc_a,
            drive.exc_a,
            x.rate_inh_a,
            x.rate_exc_b,
            drive.exc_b,
            x.adapt_exc_a,
        ),
        // FS cells do not adapt: unit-rate decay with zero coupling
        adapt_inh_a: -x.adapt_inh_a / 1.0 + 0.0 * x.rate_inh_a,
        rate_exc_b: mean_rate_b(&rs_b, x.rate_exc_b),
        rate_inh_b: mean_rate_b(&fs_b, x.rate_inh_b),
        var_exc_exc_b: variance(
            &rs_b,
            ne,
            x.rate_exc_b,
            x.var_exc_exc_b,
            x.cov_exc_inh_b,
            x.cov_exc_a_exc_b,
            x.var_exc_exc_b,
        ),
        cov_exc_inh_b: covariance(
            &rs_b,
            &fs_b,
            x.rate_exc_b,
            x.rate_inh_b,
            x.var_exc_exc_b,
            x.cov_exc_inh_b,
            x.var_inh_inh_b,
            x.cov_exc_a_inh_b,
            x.cov_exc_a_exc_b,
        ),
        var_inh_inh_b: variance(
            &fs_b,
            ni,
            x.rate_inh_b,
            x.cov_exc_inh_b,
            x.var_inh_inh_b,
            x.cov_exc_a_inh_b,
            x.var_inh_inh_b,
        ),
        adapt_exc_b: adaptation(
            x.rate_exc_b,
            drive.exc_b,
            x.rate_inh_b,
            x.rate_exc_a,
            drive.exc_a,
            x.adapt_exc_b,
        ),
        adapt_inh_b: -x.adapt_inh_b / 1.0 + 0.0 * x.rate_inh_b,
        cov_exc_a_exc_b,
        cov_exc_a_inh_b,
        cov_inh_a_exc_b,
        cov_inh_a_inh_b,
    }
}

/// Flat-vector form of [`drift`] for interop with legacy tooling
///
/// # Errors
///
/// `ShapeMismatch` if `state` is not 18 long.
pub fn drift_slice<R, F>(
    state: &[f64],
    rs: &R,
    fs: &F,
    params: &ModelParameters,
    drive: &AfferentDrive,
) -> Result<[f64; STATE_DIM]>
where
    R: TransferFunction + ?Sized,
    F: TransferFunction + ?Sized,
{
    let state = MeanFieldState::from_slice(state)?;
    Ok(drift(&state, rs, fs, params, drive).to_array())
}
