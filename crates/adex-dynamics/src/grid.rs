// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared time grid of the regulatory process and the integrator

use ndarray::Array1;

use crate::error::{DynamicsError, Result};
use crate::params::ModelParameters;

/// Uniform grid of `steps + 1` points on `[0, t_final]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    pub t_final: f64,
    pub dt: f64,
    pub steps: usize,
}

impl TimeGrid {
    /// `steps = floor(t_final / dt)`
    pub fn new(t_final: f64, dt: f64) -> Result<Self> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(DynamicsError::InvalidParameterSet(format!(
                "dt must be positive and finite, got {}",
                dt
            )));
        }
        if !(t_final >= 0.0 && t_final.is_finite()) {
            return Err(DynamicsError::InvalidParameterSet(format!(
                "t_final must be non-negative and finite, got {}",
                t_final
            )));
        }
        Ok(Self {
            t_final,
            dt,
            steps: (t_final / dt).floor() as usize,
        })
    }

    pub fn from_parameters(params: &ModelParameters) -> Result<Self> {
        Self::new(params.t_final, params.dt)
    }

    /// Number of grid points
    #[inline]
    pub fn len(&self) -> usize {
        self.steps + 1
    }

    /// Time stamps, evenly spaced from 0 to `t_final` inclusive
    ///
    /// The spacing is `t_final / steps`, which differs from `dt` when
    /// `t_final` is not a multiple of it; the integrator still steps by `dt`.
    pub fn times(&self) -> Array1<f64> {
        if self.steps == 0 {
            return Array1::zeros(1);
        }
        let spacing = self.t_final / self.steps as f64;
        let mut times = Array1::from_shape_fn(self.len(), |k| k as f64 * spacing);
        times[self.steps] = self.t_final;
        times
    }

    /// Reject a sequence whose length differs from the grid
    pub fn check_len(&self, what: &'static str, actual: usize) -> Result<()> {
        if actual != self.len() {
            return Err(DynamicsError::ShapeMismatch {
                what,
                expected: self.len(),
                actual,
            });
        }
        Ok(())
    }
}
