use crate::enums::TradeSide;
use serde::{Deserialize, Serialize};

/// A ranked momentum/volatility reading for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub instrument: String,
    /// Relative return over the momentum lookback.
    pub momentum: f64,
    /// Annualised standard deviation of daily returns over the volatility lookback.
    pub volatility: f64,
    /// `momentum / volatility`, the ranking key.
    pub score: f64,
}

/// Why an instrument was left out of the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Latest known price is under the configured floor.
    BelowMinPrice { price: f64 },
    /// The lookback window has at least one date without a price.
    MissingData,
    /// A price in the window (or the latest price) is zero or negative.
    InvalidPrice,
    /// Daily returns over the volatility window have no dispersion.
    ZeroVolatility,
    /// Momentum or score came out as NaN or infinite.
    NonFiniteScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub instrument: String,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

/// One line of the rebalancing plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeInstruction {
    pub instrument: String,
    pub side: TradeSide,
    /// Signed dollar change: positive buys, negative sells.
    pub delta_usd: f64,
    /// Last known price the estimate was made at.
    pub reference_price: f64,
    /// Signed quantity estimate, `delta_usd / reference_price`.
    pub est_quantity: f64,
}

/// Why an instrument with a weight difference produced no instruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The dollar change is smaller than the minimum trade size.
    BelowMinimum { delta_usd: f64 },
    /// No finite, positive price is available to trade at.
    MissingPrice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTrade {
    pub instrument: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}
