// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Numerical Partial Derivatives of Transfer Functions
//!
//! Centered differences with half-step offsets:
//!
//! ```text
//! ∂TF/∂fe ≈ (TF(fe + df/2, fi, w) - TF(fe - df/2, fi, w)) / df
//! ```
//!
//! Second derivatives difference the first-derivative operator again (two
//! nested centered differences, 4 TF evaluations each) rather than using a
//! single stencil. This fixes the noise floor of the closure terms.
//!
//! Naming: `diff2_X_Y` differentiates `diff_X` with respect to `Y`.
//! `diff2_fe_fi` and `diff2_fi_fe` are kept as separate code paths and are
//! never symmetrised.

use crate::transfer::TransferFunction;

/// Default finite-difference step (Hz)
pub const DEFAULT_DF: f64 = 1e-5;

/// ∂TF/∂fe
#[inline]
pub fn diff_fe<T: TransferFunction + ?Sized>(tf: &T, fe: f64, fi: f64, w: f64, df: f64) -> f64 {
    (tf.rate(fe + df / 2.0, fi, w) - tf.rate(fe - df / 2.0, fi, w)) / df
}

/// ∂TF/∂fi
#[inline]
pub fn diff_fi<T: TransferFunction + ?Sized>(tf: &T, fe: f64, fi: f64, w: f64, df: f64) -> f64 {
    (tf.rate(fe, fi + df / 2.0, w) - tf.rate(fe, fi - df / 2.0, w)) / df
}

/// ∂/∂fe (∂TF/∂fe)
#[inline]
pub fn diff2_fe_fe<T: TransferFunction + ?Sized>(
    tf: &T,
    fe: f64,
    fi: f64,
    w: f64,
    df: f64,
) -> f64 {
    (diff_fe(tf, fe + df / 2.0, fi, w, df) - diff_fe(tf, fe - df / 2.0, fi, w, df)) / df
}

/// ∂/∂fe (∂TF/∂fi)
#[inline]
pub fn diff2_fi_fe<T: TransferFunction + ?Sized>(
    tf: &T,
    fe: f64,
    fi: f64,
    w: f64,
    df: f64,
) -> f64 {
    (diff_fi(tf, fe + df / 2.0, fi, w, df) - diff_fi(tf, fe - df / 2.0, fi, w, df)) / df
}

/// ∂/∂fi (∂TF/∂fe)
#[inline]
pub fn diff2_fe_fi<T: TransferFunction + ?Sized>(
    tf: &T,
    fe: f64,
    fi: f64,
    w: f64,
    df: f64,
) -> f64 {
    (diff_fe(tf, fe, fi + df / 2.0, w, df) - diff_fe(tf, fe, fi - df / 2.0, w, df)) / df
}

/// ∂/∂fi (∂TF/∂fi)
#[inline]
pub fn diff2_fi_fi<T: TransferFunction + ?Sized>(
    tf: &T,
    fe: f64,
    fi: f64,
    w: f64,
    df: f64,
) -> f64 {
    (diff_fi(tf, fe, fi + df / 2.0, w, df) - diff_fi(tf, fe, fi - df / 2.0, w, df)) / df
}

/// Value and all partials of one transfer function at one input point
///
/// Each field is produced by the matching free function above, so the
/// numbers are identical to requesting them one by one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSensitivity {
    pub value: f64,
    pub d_fe: f64,
    pub d_fi: f64,
    pub d2_fe_fe: f64,
    pub d2_fe_fi: f64,
    pub d2_fi_fe: f64,
    pub d2_fi_fi: f64,
}

impl TransferSensitivity {
    /// 21 transfer-function evaluations
    pub fn evaluate<T: TransferFunction + ?Sized>(tf: &T, fe: f64, fi: f64, w: f64, df: f64) -> Self {
        Self {
            value: tf.rate(fe, fi, w),
            d_fe: diff_fe(tf, fe, fi, w, df),
            d_fi: diff_fi(tf, fe, fi, w, df),
            d2_fe_fe: diff2_fe_fe(tf, fe, fi, w, df),
            d2_fe_fi: diff2_fe_fi(tf, fe, fi, w, df),
            d2_fi_fe: diff2_fi_fe(tf, fe, fi, w, df),
            d2_fi_fi: diff2_fi_fi(tf, fe, fi, w, df),
        }
    }
}
