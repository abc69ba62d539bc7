use serde::{Deserialize, Serialize};

/// Direction of a rebalancing trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// The side implied by a signed dollar delta. Zero is treated as a sell,
    /// although the differ never emits a zero-sized instruction.
    pub fn from_delta(delta_usd: f64) -> Self {
        if delta_usd > 0.0 {
            TradeSide::Buy
        } else {
            TradeSide::Sell
        }
    }

    /// Sort rank used to put sells (which fund the buys) first.
    pub fn execution_rank(&self) -> u8 {
        match self {
            TradeSide::Sell => 0,
            TradeSide::Buy => 1,
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_follows_delta_sign() {
        assert_eq!(TradeSide::from_delta(12.5), TradeSide::Buy);
        assert_eq!(TradeSide::from_delta(-0.01), TradeSide::Sell);
        assert!(TradeSide::Sell.execution_rank() < TradeSide::Buy.execution_rank());
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(serde_json::to_string(&TradeSide::Buy).unwrap(), "\"BUY\"");
        assert_eq!(TradeSide::Sell.to_string(), "SELL");
    }
}
