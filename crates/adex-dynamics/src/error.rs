// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for mean-field simulation boundaries
//!
//! The numerical core itself never fails: non-finite values propagate through
//! the trajectory untouched. These errors are raised only where caller data
//! enters the system.

use crate::state::StateSlot;

/// Errors raised at the simulation boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DynamicsError {
    /// Wrong parameter count, non-finite value, or a value that makes the
    /// time grid or a time constant meaningless
    #[error("Invalid parameter set: {0}")]
    InvalidParameterSet(String),

    /// An input sequence does not match the expected length
    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A step produced a non-finite state (diagnostic, opt-in)
    #[error("Non-finite value in slot {slot} at step {step}")]
    NonFiniteResult { step: usize, slot: StateSlot },
}

pub type Result<T> = core::result::Result<T, DynamicsError>;
