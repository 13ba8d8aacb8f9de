// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run an ensemble of attentional-decision trials from a config file.
//!
//! Uses the logistic reference transfer functions; loads
//! `adex_configuration.toml` (or built-in defaults), applies `ADEX_*`
//! environment overrides and `--set key=value` overrides, then reports the
//! choice fractions. `--output` writes the first trial as CSV.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use adex_meanfield::config::{
    apply_cli_overrides, apply_environment_overrides, load_config, AdexConfig, ConfigError,
};
use adex_meanfield::dynamics::{SigmoidTransferFunction, StateSlot};
use adex_meanfield::observability::{
    debug_flags_help, init_logging, parse_debug_flags, ObservabilityConfig,
};
use adex_meanfield::{choice_fractions, Simulator, TrialOutcome, TrialSpec};
use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser};
use ndarray::Array2;
use tracing::{info, warn};

/// Ensemble runner for the two-pool AdEx mean-field model
#[derive(Parser, Debug)]
#[command(name = "run_trial", version, long_about = None)]
struct Args {
    /// Configuration file (default: search for adex_configuration.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the first trial as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override a setting: seed, trials, t_final, dt, sigma, psi0, amplitude_a,
    /// amplitude_b, drive_blending, inhibitory_afferent, non_finite, log_level
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    overrides: Vec<(String, String)>,
}

fn parse_override(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// `--debug-*` flags are consumed by the observability layer, not by clap
fn parse_args() -> Args {
    let matches = Args::command()
        .after_help(debug_flags_help())
        .get_matches_from(env::args().filter(|arg| !arg.starts_with("--debug-")));
    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

/// Explicit path must exist; otherwise fall back to defaults when no file is found
fn resolve_config(args: &Args) -> Result<(AdexConfig, Option<PathBuf>)> {
    let overrides: HashMap<String, String> = args.overrides.iter().cloned().collect();
    match load_config(args.config.as_deref(), Some(&overrides)) {
        Ok(config) => Ok((config, args.config.clone())),
        Err(ConfigError::FileNotFound(_)) if args.config.is_none() => {
            let mut config = AdexConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &overrides);
            Ok((config, None))
        }
        Err(e) => Err(e).context("Failed to load configuration"),
    }
}

fn write_csv(path: &Path, outcome: &TrialOutcome) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header = vec!["t", "psi", "lambda_a", "lambda_b"];
    header.extend(StateSlot::ALL.iter().map(|slot| slot.name()));
    writer.write_record(&header)?;

    let traj = &outcome.trajectory;
    for (i, row) in traj.states.rows().into_iter().enumerate() {
        let leading = [
            traj.times[i],
            outcome.drive.psi[i],
            outcome.drive.lambda_a[i],
            outcome.drive.lambda_b[i],
        ];
        writer.write_record(leading.iter().chain(row.iter()).map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = parse_args();
    let (config, source) = resolve_config(&args)?;

    let debug_flags = parse_debug_flags();
    let _logging = init_logging(&debug_flags, &ObservabilityConfig::with_level(&config.logging.level))?;

    match &source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("Using built-in defaults (no config file found)"),
    }

    let simulator = Simulator::from_config(
        &config,
        SigmoidTransferFunction::regular_spiking(),
        SigmoidTransferFunction::fast_spiking(),
    )?;
    let trial = TrialSpec::from_config(&config)?;
    let grid = simulator.grid()?;

    info!(
        "Running {} trial(s): {} steps of {} s, psi0 = {}",
        config.integrator.trials, grid.steps, config.model.dt, trial.psi0
    );
    let outcomes = simulator.run_ensemble(&trial, config.integrator.seed, config.integrator.trials)?;

    let (pool_a, pool_b, undecided) = choice_fractions(&outcomes);
    info!(
        "Choices: A {:.1}%  B {:.1}%  undecided {:.1}%",
        pool_a * 100.0,
        pool_b * 100.0,
        undecided * 100.0
    );

    // Ensemble mean of the final excitatory rates and gate
    let finals = Array2::from_shape_fn((outcomes.len(), 3), |(k, j)| match j {
        0 => outcomes[k].final_rate(StateSlot::RateExcA),
        1 => outcomes[k].final_rate(StateSlot::RateExcB),
        _ => outcomes[k].final_psi(),
    });
    if let Some(mean) = finals.mean_axis(ndarray::Axis(0)) {
        info!(
            "Mean final: v_eA {:.3} Hz, v_eB {:.3} Hz, psi {:.3}",
            mean[0], mean[1], mean[2]
        );
    }
    if undecided > 0.0 {
        warn!("{:.1}% of trials ended undecided or non-finite", undecided * 100.0);
    }

    if let (Some(path), Some(first)) = (&args.output, outcomes.first()) {
        write_csv(path, first)?;
        info!("Wrote trial {} to {}", first.seed, path.display());
    }

    Ok(())
}
