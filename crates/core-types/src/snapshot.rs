use crate::portfolio::WeightVector;
use crate::structs::{Exclusion, Signal, SkippedTrade, TradeInstruction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// How the ranking step ended. An empty signal table is a normal result,
/// and this tag says which kind of empty it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignalOutcome {
    Ranked,
    /// Fewer aligned trading days than the lookback windows need.
    InsufficientHistory { available: usize, required: usize },
    /// Enough history, but every instrument was excluded.
    NoEligibleInstruments,
}

/// A run that could not produce a recommendation. The snapshot still gets
/// written so the schedule keeps a complete audit trail.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RunFailure {
    #[error("No price data returned for the universe.")]
    NoPriceData,

    #[error("Price history request failed: {0}")]
    PriceFetchFailed(String),

    #[error("Portfolio settings could not be read: {0}")]
    SettingsUnavailable(String),

    #[error("Holdings could not be read: {0}")]
    HoldingsUnavailable(String),
}

/// The immutable, timestamped record of one recommendation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSnapshot {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunFailure>,
    pub universe_size: usize,
    #[serde(default)]
    pub signal_outcome: Option<SignalOutcome>,
    pub selected: Vec<String>,
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    pub portfolio_value_est: f64,
    pub current_weights: WeightVector,
    pub target_weights: WeightVector,
    pub trades: Vec<TradeInstruction>,
    #[serde(default)]
    pub skipped_trades: Vec<SkippedTrade>,
    pub notes: Vec<String>,
}

impl RecommendationSnapshot {
    /// A snapshot recording a failed run: no selection, no weights, no trades.
    pub fn failed(timestamp: DateTime<Utc>, universe_size: usize, failure: RunFailure) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            timestamp,
            notes: vec![failure.to_string()],
            error: Some(failure),
            universe_size,
            signal_outcome: None,
            selected: Vec::new(),
            signals: Vec::new(),
            exclusions: Vec::new(),
            portfolio_value_est: 0.0,
            current_weights: WeightVector::new(),
            target_weights: WeightVector::new(),
            trades: Vec::new(),
            skipped_trades: Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
