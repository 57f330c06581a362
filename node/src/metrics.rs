//! # Prometheus Metrics
//!
//! Settlement metrics for a scenario run, printed in the Prometheus text
//! exposition format when `--metrics` is given.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use cistern_protocol::{Operation, Totals};

/// Holds all Prometheus metric handles for a run.
#[derive(Clone)]
pub struct VaultMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Completed settlements, by operation.
    pub settlements_total: IntCounterVec,
    /// Assets moved by completed settlements, by operation.
    pub settled_assets_total: IntCounterVec,
    /// Steps that failed, by action.
    pub rejected_steps_total: IntCounterVec,
    /// Total assets after the last step.
    pub total_assets: IntGauge,
    /// Shares outstanding after the last step.
    pub total_shares: IntGauge,
}

impl VaultMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("cistern".into()), None)?;

        let settlements_total = IntCounterVec::new(
            Opts::new("settlements_total", "Completed vault settlements"),
            &["operation"],
        )?;
        registry.register(Box::new(settlements_total.clone()))?;

        let settled_assets_total = IntCounterVec::new(
            Opts::new(
                "settled_assets_total",
                "Underlying assets moved by completed settlements",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(settled_assets_total.clone()))?;

        let rejected_steps_total = IntCounterVec::new(
            Opts::new("rejected_steps_total", "Scenario steps that failed"),
            &["action"],
        )?;
        registry.register(Box::new(rejected_steps_total.clone()))?;

        let total_assets = IntGauge::new("total_assets", "Total assets attributed to the pool")?;
        registry.register(Box::new(total_assets.clone()))?;

        let total_shares = IntGauge::new("total_shares", "Shares outstanding")?;
        registry.register(Box::new(total_shares.clone()))?;

        Ok(Self {
            registry,
            settlements_total,
            settled_assets_total,
            rejected_steps_total,
            total_assets,
            total_shares,
        })
    }

    /// Counts one completed settlement.
    pub fn record_settlement(&self, operation: Operation, assets: u64) {
        let label = operation.to_string();
        self.settlements_total.with_label_values(&[label.as_str()]).inc();
        self.settled_assets_total
            .with_label_values(&[label.as_str()])
            .inc_by(assets);
    }

    /// Counts one failed step.
    pub fn record_rejection(&self, action: &str) {
        self.rejected_steps_total.with_label_values(&[action]).inc();
    }

    /// Sets the total gauges. Values beyond `i64::MAX` saturate.
    pub fn observe_totals(&self, totals: Totals) {
        self.total_assets
            .set(i64::try_from(totals.assets).unwrap_or(i64::MAX));
        self.total_shares
            .set(i64::try_from(totals.shares).unwrap_or(i64::MAX));
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
