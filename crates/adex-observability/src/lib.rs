// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # adex-observability
//!
//! Logging setup shared by the AdEx mean-field tools, with per-crate debug
//! flag support.
//!
//! ## Features
//! - `file-logging`: JSON log file per run in a timestamped folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "adex-meanfield",
    "adex-dynamics",
    "adex-config",
    "adex-observability",
];
