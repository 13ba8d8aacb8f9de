// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Mean-Field State
//!
//! The 18 moments of the two-pool system. Named fields are used everywhere
//! except in the integration loop, which works on flat rows.
//!
//! ```text
//!  idx | pool A            idx | pool B            idx | cross-pool
//!  0   | v_e               7   | v_e               14  | C(eA, eB)
//!  1   | v_i               8   | v_i               15  | C(eA, iB)
//!  2   | C(e, e)           9   | C(e, e)           16  | C(iA, eB)
//!  3   | C(e, i)           10  | C(e, i)           17  | C(iA, iB)
//!  4   | C(i, i)           11  | C(i, i)
//!  5   | W_e               12  | W_e
//!  6   | W_i               13  | W_i
//! ```
//!
//! Variances and covariances are not kept positive semi-definite; the
//! closure can leave that cone and the integrator does not intervene.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DynamicsError, Result};

/// Number of state components
pub const STATE_DIM: usize = 18;

/// Slots that receive direct stochastic forcing, in noise-column order
pub const MEAN_RATE_SLOTS: [StateSlot; 4] = [
    StateSlot::RateExcA,
    StateSlot::RateInhA,
    StateSlot::RateExcB,
    StateSlot::RateInhB,
];

/// Semantic index into the flat state vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateSlot {
    RateExcA = 0,
    RateInhA = 1,
    VarExcExcA = 2,
    CovExcInhA = 3,
    VarInhInhA = 4,
    AdaptExcA = 5,
    AdaptInhA = 6,
    RateExcB = 7,
    RateInhB = 8,
    VarExcExcB = 9,
    CovExcInhB = 10,
    VarInhInhB = 11,
    AdaptExcB = 12,
    AdaptInhB = 13,
    CovExcAExcB = 14,
    CovExcAInhB = 15,
    CovInhAExcB = 16,
    CovInhAInhB = 17,
}

impl StateSlot {
    pub const ALL: [StateSlot; STATE_DIM] = [
        StateSlot::RateExcA,
        StateSlot::RateInhA,
        StateSlot::VarExcExcA,
        StateSlot::CovExcInhA,
        StateSlot::VarInhInhA,
        StateSlot::AdaptExcA,
        StateSlot::AdaptInhA,
        StateSlot::RateExcB,
        StateSlot::RateInhB,
        StateSlot::VarExcExcB,
        StateSlot::CovExcInhB,
        StateSlot::VarInhInhB,
        StateSlot::AdaptExcB,
        StateSlot::AdaptInhB,
        StateSlot::CovExcAExcB,
        StateSlot::CovExcAInhB,
        StateSlot::CovInhAExcB,
        StateSlot::CovInhAInhB,
    ];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            StateSlot::RateExcA => "v_eA",
            StateSlot::RateInhA => "v_iA",
            StateSlot::VarExcExcA => "C_eAeA",
            StateSlot::CovExcInhA => "C_eAiA",
            StateSlot::VarInhInhA => "C_iAiA",
            StateSlot::AdaptExcA => "W_eA",
            StateSlot::AdaptInhA => "W_iA",
            StateSlot::RateExcB => "v_eB",
            StateSlot::RateInhB => "v_iB",
            StateSlot::VarExcExcB => "C_eBeB",
            StateSlot::CovExcInhB => "C_eBiB",
            StateSlot::VarInhInhB => "C_iBiB",
            StateSlot::AdaptExcB => "W_eB",
            StateSlot::AdaptInhB => "W_iB",
            StateSlot::CovExcAExcB => "C_eAeB",
            StateSlot::CovExcAInhB => "C_eAiB",
            StateSlot::CovInhAExcB => "C_iAeB",
            StateSlot::CovInhAInhB => "C_iAiB",
        }
    }
}

impl fmt::Display for StateSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.index())
    }
}

/// Named record of the 18 moments (also used for drift vectors)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanFieldState {
    pub rate_exc_a: f64,
    pub rate_inh_a: f64,
    pub var_exc_exc_a: f64,
    pub cov_exc_inh_a: f64,
    pub var_inh_inh_a: f64,
    pub adapt_exc_a: f64,
    pub adapt_inh_a: f64,
    pub rate_exc_b: f64,
    pub rate_inh_b: f64,
    pub var_exc_exc_b: f64,
    pub cov_exc_inh_b: f64,
    pub var_inh_inh_b: f64,
    pub adapt_exc_b: f64,
    pub adapt_inh_b: f64,
    pub cov_exc_a_exc_b: f64,
    pub cov_exc_a_inh_b: f64,
    pub cov_inh_a_exc_b: f64,
    pub cov_inh_a_inh_b: f64,
}

impl MeanFieldState {
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Build from a flat array in slot order
    pub fn from_array(v: [f64; STATE_DIM]) -> Self {
        Self {
            rate_exc_a: v[0],
            rate_inh_a: v[1],
            var_exc_exc_a: v[2],
            cov_exc_inh_a: v[3],
            var_inh_inh_a: v[4],
            adapt_exc_a: v[5],
            adapt_inh_a: v[6],
            rate_exc_b: v[7],
            rate_inh_b: v[8],
            var_exc_exc_b: v[9],
            cov_exc_inh_b: v[10],
            var_inh_inh_b: v[11],
            adapt_exc_b: v[12],
            adapt_inh_b: v[13],
            cov_exc_a_exc_b: v[14],
            cov_exc_a_inh_b: v[15],
            cov_inh_a_exc_b: v[16],
            cov_inh_a_inh_b: v[17],
        }
    }

    /// Build from a flat slice, rejecting anything that is not 18 long
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let array: [f64; STATE_DIM] =
            values
                .try_into()
                .map_err(|_| DynamicsError::ShapeMismatch {
                    what: "state vector",
                    expected: STATE_DIM,
                    actual: values.len(),
                })?;
        Ok(Self::from_array(array))
    }

    pub fn to_array(&self) -> [f64; STATE_DIM] {
        [
            self.rate_exc_a,
            self.rate_inh_a,
            self.var_exc_exc_a,
            self.cov_exc_inh_a,
            self.var_inh_inh_a,
            self.adapt_exc_a,
            self.adapt_inh_a,
            self.rate_exc_b,
            self.rate_inh_b,
            self.var_exc_exc_b,
            self.cov_exc_inh_b,
            self.var_inh_inh_b,
            self.adapt_exc_b,
            self.adapt_inh_b,
            self.cov_exc_a_exc_b,
            self.cov_exc_a_inh_b,
            self.cov_inh_a_exc_b,
            self.cov_inh_a_inh_b,
        ]
    }

    pub fn get(&self, slot: StateSlot) -> f64 {
        self.to_array()[slot.index()]
    }

    /// First slot holding a NaN or infinity, if any
    pub fn first_non_finite(&self) -> Option<StateSlot> {
        self.to_array()
            .iter()
            .position(|v| !v.is_finite())
            .and_then(StateSlot::from_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_indices_follow_layout() {
        for (i, slot) in StateSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
            assert_eq!(StateSlot::from_index(i), Some(*slot));
        }
        assert_eq!(StateSlot::from_index(STATE_DIM), None);
        assert_eq!(
            MEAN_RATE_SLOTS.map(StateSlot::index),
            [0, 1, 7, 8]
        );
    }

    #[test]
    fn test_named_fields_match_flat_order() {
        let flat: Vec<f64> = (0..STATE_DIM).map(|i| i as f64).collect();
        let state = MeanFieldState::from_slice(&flat).unwrap();

        assert_eq!(state.rate_exc_b, 7.0);
        assert_eq!(state.adapt_exc_b, 12.0);
        assert_eq!(state.cov_inh_a_exc_b, 16.0);
        assert_eq!(state.get(StateSlot::CovExcInhA), 3.0);
        assert_eq!(state.to_array().to_vec(), flat);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = MeanFieldState::from_slice(&[0.0; 17]).unwrap_err();
        assert_eq!(
            err,
            DynamicsError::ShapeMismatch {
                what: "state vector",
                expected: 18,
                actual: 17
            }
        );
    }

    #[test]
    fn test_first_non_finite() {
        let mut state = MeanFieldState::zeros();
        assert_eq!(state.first_non_finite(), None);

        state.cov_exc_a_inh_b = f64::NAN;
        state.var_inh_inh_b = f64::INFINITY;
        assert_eq!(state.first_non_finite(), Some(StateSlot::VarInhInhB));
    }
}
