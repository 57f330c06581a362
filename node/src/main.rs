// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Cistern Scenario Runner
//!
//! Entry point for the `cistern` binary. Parses CLI arguments, initializes
//! logging and metrics, and runs the requested subcommand.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — execute a JSON scenario against an in-memory vault
//! - `preview` — compute one conversion against explicit totals
//! - `version` — print build version information

mod cli;
mod logging;
mod metrics;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use cistern_protocol::conversion::{assets_for_shares, shares_for_assets};
use cistern_protocol::{Operation, Rounding, Totals};

use cli::{CisternCli, Commands};
use metrics::VaultMetrics;
use scenario::Scenario;

fn main() -> Result<()> {
    let cli = CisternCli::parse();

    match cli.command {
        Commands::Run(args) => run_scenario(args),
        Commands::Preview(args) => preview(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Runs a scenario file and prints the report (and metrics) to stdout.
fn run_scenario(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, args.log_format)
        .context("failed to initialize logging")?;

    tracing::info!(scenario = %args.scenario.display(), "loading scenario");
    let scenario = Scenario::load(&args.scenario)?;

    let vault_metrics = VaultMetrics::new().context("failed to register metrics")?;
    let report = scenario::run(&scenario, &vault_metrics)?;

    let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
    println!("{}", json);

    if args.metrics {
        let text = vault_metrics.encode().context("failed to encode metrics")?;
        print!("{}", text);
    }

    if report.failures() > 0 {
        tracing::warn!(failures = report.failures(), "scenario finished with failed steps");
    }
    Ok(())
}

/// Result of `cistern preview`.
#[derive(Debug, PartialEq, Eq, Serialize)]
struct PreviewOutput {
    operation: Operation,
    amount: u64,
    totals: Totals,
    rounding: &'static str,
    result: u64,
}

/// Computes what one flow would settle for at the given totals.
fn compute_preview(operation: Operation, amount: u64, totals: Totals) -> Result<PreviewOutput> {
    let rounding = match operation {
        Operation::Deposit | Operation::Redeem => Rounding::Down,
        Operation::Mint | Operation::Withdraw => Rounding::Up,
    };
    let result = match operation {
        Operation::Deposit | Operation::Withdraw => shares_for_assets(amount, totals, rounding)?,
        Operation::Mint | Operation::Redeem => assets_for_shares(amount, totals, rounding)?,
    };
    Ok(PreviewOutput {
        operation,
        amount,
        totals,
        rounding: match rounding {
            Rounding::Down => "down",
            Rounding::Up => "up",
        },
        result,
    })
}

fn preview(args: cli::PreviewArgs) -> Result<()> {
    let totals = Totals::new(args.total_assets, args.total_shares);
    let output = compute_preview(args.operation.into(), args.amount, totals).with_context(|| {
        format!(
            "cannot preview at {} assets / {} shares",
            totals.assets, totals.shares
        )
    })?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("cistern  {}", env!("CARGO_PKG_VERSION"));
    println!("protocol {}", cistern_protocol::config::PROTOCOL_VERSION);
    println!("rustc    {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
