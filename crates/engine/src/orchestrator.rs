use crate::error::{EngineError, PortError};
use crate::ports::{HoldingsStore, PriceHistoryProvider, SettingsStore, SnapshotStore};
use allocation::AllocationBuilder;
use chrono::{DateTime, Days, Utc};
use configuration::StrategyConfig;
use core_types::{RecommendationSnapshot, RunFailure, SignalOutcome};
use portfolio::PortfolioDiffer;
use signals::SignalEngine;
use std::sync::Arc;
use uuid::Uuid;

/// Informational notes attached to every successful snapshot.
pub const STANDARD_NOTES: [&str; 3] = [
    "Momentum/volatility screen only; past returns say nothing certain about future ones.",
    "Trades ignore taxes, spreads, slippage, liquidity, corporate actions and broker rules.",
    "Recommendations only: nothing here places or routes orders.",
];

/// The collaborators a `RecommendationEngine` reads from and writes to.
#[derive(Clone)]
pub struct Ports {
    pub prices: Arc<dyn PriceHistoryProvider>,
    pub settings: Arc<dyn SettingsStore>,
    pub holdings: Arc<dyn HoldingsStore>,
    pub snapshots: Arc<dyn SnapshotStore>,
}

/// Runs one end-to-end recommendation pass: settings, prices, ranking,
/// allocation, diff, snapshot.
///
/// The engine holds no run state and does no locking of its own; callers that
/// can trigger overlapping runs serialise them (see `RunGate`).
pub struct RecommendationEngine {
    signal_engine: SignalEngine,
    differ: PortfolioDiffer,
    history_days: u32,
    ports: Ports,
}

impl RecommendationEngine {
    pub fn new(strategy: &StrategyConfig, ports: Ports) -> Result<Self, EngineError> {
        if strategy.history_days == 0 {
            return Err(EngineError::Configuration(
                "history_days must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            signal_engine: SignalEngine::from_config(strategy)?,
            differ: PortfolioDiffer::from_config(strategy),
            history_days: strategy.history_days,
            ports,
        })
    }

    /// Runs a pass as of now.
    pub async fn run(&self) -> Result<RecommendationSnapshot, EngineError> {
        self.run_at(Utc::now()).await
    }

    /// Runs a pass as of `now` and appends the snapshot to the store.
    ///
    /// Collaborator failures are recorded in the snapshot itself. The only
    /// error returned is a snapshot that could not be stored.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RecommendationSnapshot, EngineError> {
        tracing::info!(as_of = %now, "Starting recommendation run.");
        let snapshot = self.compute(now).await;

        if let Err(source) = self.ports.snapshots.append(&snapshot).await {
            tracing::error!(run_id = %snapshot.run_id, error = %source, "Failed to save snapshot.");
            return Err(EngineError::SnapshotNotSaved {
                run_id: snapshot.run_id,
                source,
            });
        }

        match &snapshot.error {
            Some(failure) => tracing::warn!(run_id = %snapshot.run_id, %failure, "Run recorded as failed."),
            None => tracing::info!(
                run_id = %snapshot.run_id,
                selected = snapshot.selected.len(),
                trades = snapshot.trades.len(),
                "Recommendation run complete."
            ),
        }
        Ok(snapshot)
    }

    async fn compute(&self, now: DateTime<Utc>) -> RecommendationSnapshot {
        let settings = match self.ports.settings.portfolio_settings().await {
            Ok(settings) => settings,
            Err(e) => return failed(now, 0, RunFailure::SettingsUnavailable(e.to_string()), &e),
        };
        let universe_size = settings.universe.len();

        let end = now.date_naive();
        let start = end
            .checked_sub_days(Days::new(u64::from(self.history_days)))
            .unwrap_or(end);

        let prices = match self.ports.prices.fetch(&settings.universe, start, end).await {
            Ok(prices) => prices,
            Err(e) => {
                return failed(now, universe_size, RunFailure::PriceFetchFailed(e.to_string()), &e);
            }
        };
        if prices.is_empty() {
            tracing::warn!(universe_size, "No price data returned for the universe.");
            return RecommendationSnapshot::failed(now, universe_size, RunFailure::NoPriceData);
        }

        let ranking = self.signal_engine.rank(&prices);
        let selected = ranking.top(settings.top_n);

        let holdings = match self.ports.holdings.holdings().await {
            Ok(holdings) => holdings,
            Err(e) => {
                return failed(now, universe_size, RunFailure::HoldingsUnavailable(e.to_string()), &e);
            }
        };

        let target = AllocationBuilder::from_settings(&settings).build(&selected);
        let plan = self.differ.diff(&holdings, &prices.last_prices(), &target);

        let mut notes: Vec<String> = STANDARD_NOTES.iter().map(|n| n.to_string()).collect();
        match ranking.outcome {
            SignalOutcome::InsufficientHistory { available, required } => notes.push(format!(
                "Only {available} trading days of history were available and {required} are needed; the target is all cash."
            )),
            SignalOutcome::NoEligibleInstruments => {
                notes.push("No instrument passed the screen; the target is all cash.".to_string())
            }
            SignalOutcome::Ranked => {}
        }

        RecommendationSnapshot {
            run_id: Uuid::new_v4(),
            timestamp: now,
            error: None,
            universe_size,
            signal_outcome: Some(ranking.outcome),
            selected,
            signals: ranking.signals,
            exclusions: ranking.exclusions,
            portfolio_value_est: plan.total_value,
            current_weights: plan.current_weights,
            target_weights: target,
            trades: plan.trades,
            skipped_trades: plan.skipped,
            notes,
        }
    }
}

fn failed(
    now: DateTime<Utc>,
    universe_size: usize,
    failure: RunFailure,
    cause: &PortError,
) -> RecommendationSnapshot {
    tracing::warn!(error = %cause, "Recommendation run could not complete.");
    RecommendationSnapshot::failed(now, universe_size, failure)
}
