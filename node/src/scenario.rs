//! # Scenario Runner
//!
//! A scenario is a JSON document describing one vault, its underlying
//! asset, and an ordered list of steps. The runner builds the vault over an
//! in-memory [`AssetToken`], executes the steps in order, and collects a
//! [`Report`]. A failing step is recorded and the run continues.
//!
//! ```json
//! {
//!   "vault": { "name": "Cistern USD Vault", "symbol": "cvUSD", "custody_account": "vault" },
//!   "asset": { "name": "Cistern Dollar", "symbol": "CUSD", "decimals": 6 },
//!   "steps": [
//!     { "action": "fund", "account": "alice", "amount": 1000 },
//!     { "action": "approve", "owner": "alice", "amount": 1000 },
//!     { "action": "deposit", "caller": "alice", "assets": 1000 },
//!     { "action": "accrue", "amount": 500 },
//!     { "action": "redeem", "caller": "alice", "shares": 400 }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cistern_contracts::{AssetToken, DepositCap, HookChain, HookRecorder, MinimumPosition};
use cistern_protocol::ledger::ShareRegistry;
use cistern_protocol::{AccountId, EventLog, Operation, Totals, Vault, VaultConfig, VaultEvent};

use crate::metrics::VaultMetrics;

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// A complete scenario document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Vault identity.
    pub vault: VaultConfig,
    /// The underlying asset to issue.
    pub asset: AssetSpec,
    /// Optional deposit cap policy.
    #[serde(default)]
    pub deposit_cap: Option<DepositCap>,
    /// Optional minimum non-zero share position.
    #[serde(default)]
    pub minimum_position: Option<u64>,
    /// Steps, executed in order.
    pub steps: Vec<Step>,
}

/// Metadata of the asset the vault holds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssetSpec {
    /// Token name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Token decimals.
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Issuer account; funds and accruals are minted by it.
    #[serde(default = "default_issuer")]
    pub issuer: AccountId,
}

fn default_decimals() -> u8 {
    cistern_protocol::config::DEFAULT_DECIMALS
}

fn default_issuer() -> AccountId {
    AccountId::from("issuer")
}

/// One scenario step. Omitted receivers and owners default to the caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Mint asset tokens to `account`.
    Fund { account: AccountId, amount: u64 },
    /// Approve the vault's custody account to pull `owner`'s assets.
    Approve { owner: AccountId, amount: u64 },
    /// Approve `spender` to withdraw or redeem `owner`'s shares.
    ApproveShares {
        owner: AccountId,
        spender: AccountId,
        amount: u64,
    },
    /// Mint asset tokens straight into custody.
    Accrue { amount: u64 },
    /// `Vault::deposit`.
    Deposit {
        caller: AccountId,
        assets: u64,
        #[serde(default)]
        receiver: Option<AccountId>,
    },
    /// `Vault::mint`.
    Mint {
        caller: AccountId,
        shares: u64,
        #[serde(default)]
        receiver: Option<AccountId>,
    },
    /// `Vault::withdraw`.
    Withdraw {
        caller: AccountId,
        assets: u64,
        #[serde(default)]
        receiver: Option<AccountId>,
        #[serde(default)]
        owner: Option<AccountId>,
    },
    /// `Vault::redeem`.
    Redeem {
        caller: AccountId,
        shares: u64,
        #[serde(default)]
        receiver: Option<AccountId>,
        #[serde(default)]
        owner: Option<AccountId>,
    },
}

impl Step {
    /// The `action` tag of this step.
    pub fn action(&self) -> &'static str {
        match self {
            Step::Fund { .. } => "fund",
            Step::Approve { .. } => "approve",
            Step::ApproveShares { .. } => "approve_shares",
            Step::Accrue { .. } => "accrue",
            Step::Deposit { .. } => "deposit",
            Step::Mint { .. } => "mint",
            Step::Withdraw { .. } => "withdraw",
            Step::Redeem { .. } => "redeem",
        }
    }
}

impl Scenario {
    /// Parses a scenario from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse scenario")
    }

    /// Reads and parses a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario file: {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Result of a scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Vault identity as built.
    pub vault: VaultSummary,
    /// One entry per step, in order.
    pub steps: Vec<StepReport>,
    /// Every emitted settlement event, in order.
    pub events: Vec<VaultEvent>,
    /// Hook invocations observed during the run.
    pub hook_calls: usize,
    /// Totals after the last step.
    pub totals: Totals,
    /// Share balances after the last step.
    pub share_holders: BTreeMap<AccountId, u64>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

/// Vault identity in a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSummary {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub asset: String,
    pub custody: AccountId,
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Zero-based position in the scenario.
    pub index: usize,
    /// The step's action tag.
    pub action: String,
    /// What happened.
    pub outcome: Outcome,
}

/// What a step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The step completed. Flows report the amount they returned.
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<u64>,
    },
    /// The step failed and changed nothing.
    Failed { error: String },
}

impl Report {
    /// Number of failed steps.
    pub fn failures(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, Outcome::Failed { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Builds the scenario's vault and executes its steps.
pub struct ScenarioRunner<'a> {
    vault: Vault,
    token: Arc<AssetToken>,
    shares: Arc<ShareRegistry>,
    events: Arc<EventLog>,
    recorder: Arc<HookRecorder>,
    issuer: AccountId,
    metrics: &'a VaultMetrics,
}

impl<'a> ScenarioRunner<'a> {
    /// Builds the vault described by `scenario`.
    pub fn new(scenario: &Scenario, metrics: &'a VaultMetrics) -> Result<Self> {
        let spec = &scenario.asset;
        let token = Arc::new(
            AssetToken::create(&spec.name, &spec.symbol, spec.decimals, spec.issuer.clone())
                .context("failed to issue scenario asset")?,
        );
        let shares = Arc::new(ShareRegistry::new());
        let events = Arc::new(EventLog::new());
        let recorder = Arc::new(HookRecorder::new());

        let mut hooks = HookChain::new();
        if let Some(minimum) = scenario.minimum_position {
            hooks = hooks.with(Arc::new(MinimumPosition::new(minimum)));
        }
        hooks = hooks.with(recorder.clone());

        let mut builder = Vault::builder(scenario.vault.clone(), token.clone(), shares.clone())
            .hooks(Arc::new(hooks))
            .events(events.clone());
        if let Some(cap) = scenario.deposit_cap {
            builder = builder.policy(Arc::new(cap));
        }
        let vault = builder.build().context("invalid vault configuration")?;

        info!(
            vault = %vault.name(),
            asset = %vault.asset(),
            steps = scenario.steps.len(),
            "scenario vault ready"
        );

        Ok(Self {
            vault,
            token,
            shares,
            events,
            recorder,
            issuer: spec.issuer.clone(),
            metrics,
        })
    }

    /// Runs every step and returns the report.
    pub fn run(self, steps: &[Step]) -> Result<Report> {
        let mut reports = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let outcome = match self.execute(step) {
                Ok(amount) => Outcome::Ok { amount },
                Err(e) => {
                    warn!(index, action = step.action(), error = %e, "step failed");
                    self.metrics.record_rejection(step.action());
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            reports.push(StepReport {
                index,
                action: step.action().to_string(),
                outcome,
            });
        }

        let totals = self.vault.totals()?;
        self.metrics.observe_totals(totals);

        let report = Report {
            vault: VaultSummary {
                name: self.vault.name().to_string(),
                symbol: self.vault.symbol().to_string(),
                decimals: self.vault.decimals(),
                asset: self.vault.asset().to_string(),
                custody: self.vault.custody().clone(),
            },
            steps: reports,
            events: self.events.events(),
            hook_calls: self.recorder.calls().len(),
            totals,
            share_holders: self.shares.snapshot().balances,
            finished_at: Utc::now(),
        };
        info!(
            steps = report.steps.len(),
            failures = report.failures(),
            total_assets = totals.assets,
            total_shares = totals.shares,
            "scenario finished"
        );
        Ok(report)
    }

    fn execute(&self, step: &Step) -> Result<Option<u64>> {
        let custody = self.vault.custody();
        match step {
            Step::Fund { account, amount } => {
                self.token.mint(&self.issuer, account, *amount)?;
                Ok(None)
            }
            Step::Approve { owner, amount } => {
                self.token.approve(owner, custody, *amount);
                Ok(None)
            }
            Step::ApproveShares {
                owner,
                spender,
                amount,
            } => {
                self.shares.approve(owner, spender, *amount);
                Ok(None)
            }
            Step::Accrue { amount } => {
                self.token.mint(&self.issuer, custody, *amount)?;
                Ok(None)
            }
            Step::Deposit {
                caller,
                assets,
                receiver,
            } => {
                let receiver = receiver.as_ref().unwrap_or(caller);
                let shares = self.vault.deposit(caller, *assets, receiver)?;
                self.metrics.record_settlement(Operation::Deposit, *assets);
                Ok(Some(shares))
            }
            Step::Mint {
                caller,
                shares,
                receiver,
            } => {
                let receiver = receiver.as_ref().unwrap_or(caller);
                let assets = self.vault.mint(caller, *shares, receiver)?;
                self.metrics.record_settlement(Operation::Mint, assets);
                Ok(Some(assets))
            }
            Step::Withdraw {
                caller,
                assets,
                receiver,
                owner,
            } => {
                let receiver = receiver.as_ref().unwrap_or(caller);
                let owner = owner.as_ref().unwrap_or(caller);
                let shares = self.vault.withdraw(caller, *assets, receiver, owner)?;
                self.metrics.record_settlement(Operation::Withdraw, *assets);
                Ok(Some(shares))
            }
            Step::Redeem {
                caller,
                shares,
                receiver,
                owner,
            } => {
                let receiver = receiver.as_ref().unwrap_or(caller);
                let owner = owner.as_ref().unwrap_or(caller);
                let assets = self.vault.redeem(caller, *shares, receiver, owner)?;
                self.metrics.record_settlement(Operation::Redeem, assets);
                Ok(Some(assets))
            }
        }
    }
}

/// Builds the scenario's vault and runs all of its steps.
pub fn run(scenario: &Scenario, metrics: &VaultMetrics) -> Result<Report> {
    ScenarioRunner::new(scenario, metrics)?.run(&scenario.steps)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const DEMO: &str = r#"{
        "vault": { "name": "Cistern USD Vault", "symbol": "cvUSD", "custody_account": "vault" },
        "asset": { "name": "Cistern Dollar", "symbol": "CUSD", "decimals": 6 },
        "steps": [
            { "action": "fund", "account": "alice", "amount": 1000 },
            { "action": "approve", "owner": "alice", "amount": 1000 },
            { "action": "deposit", "caller": "alice", "assets": 1000 },
            { "action": "accrue", "amount": 500 },
            { "action": "fund", "account": "bob", "amount": 151 },
            { "action": "approve", "owner": "bob", "amount": 151 },
            { "action": "deposit", "caller": "bob", "assets": 150 },
            { "action": "deposit", "caller": "bob", "assets": 1 },
            { "action": "redeem", "caller": "mallory", "shares": 10, "owner": "alice" },
            { "action": "approve_shares", "owner": "alice", "spender": "carol", "amount": 100 },
            { "action": "withdraw", "caller": "carol", "assets": 100, "owner": "alice" }
        ]
    }"#;

    fn run_demo() -> (Report, VaultMetrics) {
        let metrics = VaultMetrics::new().unwrap();
        let scenario = Scenario::from_json(DEMO).unwrap();
        let report = run(&scenario, &metrics).unwrap();
        (report, metrics)
    }

    #[test]
    fn demo_scenario_settles_as_expected() {
        let (report, _) = run_demo();

        assert_eq!(report.vault.decimals, 6);
        assert_eq!(report.steps.len(), 11);
        assert_eq!(report.steps[2].outcome, Outcome::Ok { amount: Some(1_000) });
        assert_eq!(report.steps[6].outcome, Outcome::Ok { amount: Some(100) });
        assert!(matches!(report.steps[7].outcome, Outcome::Failed { .. }));
        assert!(matches!(report.steps[8].outcome, Outcome::Failed { .. }));
        // 100 * 1100 / 1650 = 66.67, rounded up.
        assert_eq!(report.steps[10].outcome, Outcome::Ok { amount: Some(67) });

        assert_eq!(report.failures(), 2);
        assert_eq!(report.events.len(), 3);
        assert_eq!(report.hook_calls, 3);
        assert_eq!(report.totals, Totals::new(1_550, 1_033));
        assert_eq!(report.share_holders.get(&AccountId::from("alice")), Some(&933));
    }

    #[test]
    fn metrics_follow_the_run() {
        let (_, metrics) = run_demo();
        let text = metrics.encode().unwrap();
        assert!(text.contains("cistern_settlements_total{operation=\"deposit\"} 2"));
        assert!(text.contains("cistern_settlements_total{operation=\"withdraw\"} 1"));
        assert!(text.contains("cistern_rejected_steps_total{action=\"deposit\"} 1"));
        assert!(text.contains("cistern_total_shares 1033"));
    }

    #[test]
    fn deposit_cap_and_minimum_position_apply() {
        let text = r#"{
            "vault": { "name": "Capped", "symbol": "cap", "custody_account": "vault" },
            "asset": { "name": "Dollar", "symbol": "USD" },
            "deposit_cap": { "asset_cap": 500 },
            "minimum_position": 50,
            "steps": [
                { "action": "fund", "account": "alice", "amount": 1000 },
                { "action": "approve", "owner": "alice", "amount": 1000 },
                { "action": "deposit", "caller": "alice", "assets": 600 },
                { "action": "deposit", "caller": "alice", "assets": 10 },
                { "action": "mint", "caller": "alice", "shares": 500 },
                { "action": "redeem", "caller": "alice", "shares": 460 }
            ]
        }"#;
        let metrics = VaultMetrics::new().unwrap();
        let report = run(&Scenario::from_json(text).unwrap(), &metrics).unwrap();

        let failed: Vec<usize> = report
            .steps
            .iter()
            .filter(|s| matches!(s.outcome, Outcome::Failed { .. }))
            .map(|s| s.index)
            .collect();
        assert_eq!(failed, vec![2, 3, 5]);
        assert_eq!(report.vault.decimals, 18);
        assert_eq!(report.totals, Totals::new(500, 500));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DEMO.as_bytes()).unwrap();
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.steps.len(), 11);
        assert_eq!(scenario.steps[9].action(), "approve_shares");
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = Scenario::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.json"));
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let text = r#"{
            "vault": { "name": "V", "symbol": "v", "custody_account": "vault" },
            "asset": { "name": "A", "symbol": "A" },
            "steps": [ { "action": "borrow", "caller": "alice", "assets": 1 } ]
        }"#;
        assert!(Scenario::from_json(text).is_err());
    }

    #[test]
    fn invalid_vault_config_fails_the_run() {
        let text = r#"{
            "vault": { "name": "", "symbol": "v", "custody_account": "vault" },
            "asset": { "name": "A", "symbol": "A" },
            "steps": []
        }"#;
        let metrics = VaultMetrics::new().unwrap();
        let scenario = Scenario::from_json(text).unwrap();
        assert!(run(&scenario, &metrics).is_err());
    }
}
