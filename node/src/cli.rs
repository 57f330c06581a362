//! # CLI Interface
//!
//! Defines the command-line argument structure for `cistern` using `clap`
//! derive. Supports three subcommands: `run`, `preview`, and `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use cistern_protocol::Operation;

use crate::logging::LogFormat;

/// Cistern vault scenario runner.
///
/// Drives a pooled-asset vault through a scripted scenario against
/// in-memory ledgers and reports every settlement, or previews a single
/// conversion against given totals.
#[derive(Parser, Debug)]
#[command(
    name = "cistern",
    about = "Cistern vault scenario runner",
    version,
    propagate_version = true
)]
pub struct CisternCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `cistern` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a JSON scenario and print the settlement report.
    Run(RunArgs),
    /// Preview one flow against explicit totals without running a vault.
    Preview(PreviewArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the scenario file (JSON).
    #[arg(long, short = 's', env = "CISTERN_SCENARIO")]
    pub scenario: PathBuf,

    /// Log output format. Logs go to stderr.
    #[arg(long, value_enum, env = "CISTERN_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Print Prometheus metrics after the report.
    #[arg(long)]
    pub metrics: bool,
}

/// Arguments for the `preview` subcommand.
#[derive(Parser, Debug)]
pub struct PreviewArgs {
    /// Total assets attributed to the pool.
    #[arg(long)]
    pub total_assets: u64,

    /// Shares outstanding.
    #[arg(long)]
    pub total_shares: u64,

    /// Flow to preview.
    #[arg(long, value_enum)]
    pub operation: OperationArg,

    /// Assets for deposit/withdraw, shares for mint/redeem.
    #[arg(long)]
    pub amount: u64,
}

/// The flow named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OperationArg {
    /// Assets in, shares out (rounded down).
    Deposit,
    /// Shares out, assets in (rounded up).
    Mint,
    /// Assets out, shares in (rounded up).
    Withdraw,
    /// Shares in, assets out (rounded down).
    Redeem,
}

impl From<OperationArg> for Operation {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::Deposit => Operation::Deposit,
            OperationArg::Mint => Operation::Mint,
            OperationArg::Withdraw => Operation::Withdraw,
            OperationArg::Redeem => Operation::Redeem,
        }
    }
}
