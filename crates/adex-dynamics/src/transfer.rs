// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Transfer Functions
//!
//! A transfer function maps (excitatory input rate, inhibitory input rate,
//! adaptation) to the mean output rate of a cell type. The operator treats
//! it as an opaque, deterministic, smooth function; any fit or lookup table
//! can be plugged in.
//!
//! Closures implement the trait directly:
//!
//! ```
//! use adex_dynamics::TransferFunction;
//!
//! let affine = |fe: f64, fi: f64, _w: f64| 2.0 * fe - fi;
//! assert_eq!(affine.rate(3.0, 1.0, 0.0), 5.0);
//! ```

use serde::{Deserialize, Serialize};

/// Mean-rate transfer function of one cell type
pub trait TransferFunction {
    /// Output rate for the given input rates and adaptation level
    fn rate(&self, exc_rate: f64, inh_rate: f64, adaptation: f64) -> f64;
}

impl<F> TransferFunction for F
where
    F: Fn(f64, f64, f64) -> f64,
{
    #[inline(always)]
    fn rate(&self, exc_rate: f64, inh_rate: f64, adaptation: f64) -> f64 {
        self(exc_rate, inh_rate, adaptation)
    }
}

/// Logistic stand-in for a fitted AdEx transfer function
///
/// ```text
/// rate = max_rate / (1 + exp(-gain * (fe - inh_weight*fi - adaptation_weight*w - threshold)))
/// ```
///
/// Smooth everywhere, so every derivative the moment closure needs exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidTransferFunction {
    pub max_rate: f64,
    pub gain: f64,
    pub threshold: f64,
    pub inh_weight: f64,
    pub adaptation_weight: f64,
}

impl SigmoidTransferFunction {
    /// Regular-spiking (excitatory) defaults
    pub fn regular_spiking() -> Self {
        Self {
            max_rate: 60.0,
            gain: 0.25,
            threshold: 12.0,
            inh_weight: 0.8,
            adaptation_weight: 5e9,
        }
    }

    /// Fast-spiking (inhibitory) defaults; steeper and with a higher ceiling
    pub fn fast_spiking() -> Self {
        Self {
            max_rate: 120.0,
            gain: 0.3,
            threshold: 10.0,
            inh_weight: 0.6,
            adaptation_weight: 0.0,
        }
    }
}

impl TransferFunction for SigmoidTransferFunction {
    #[inline]
    fn rate(&self, exc_rate: f64, inh_rate: f64, adaptation: f64) -> f64 {
        let drive = exc_rate
            - self.inh_weight * inh_rate
            - self.adaptation_weight * adaptation
            - self.threshold;
        self.max_rate / (1.0 + (-self.gain * drive).exp())
    }
}
