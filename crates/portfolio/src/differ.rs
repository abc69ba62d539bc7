use crate::valuation::{usable_price, value_holdings};
use configuration::StrategyConfig;
use core_types::{
    CASH, Holdings, SkipReason, SkippedTrade, TradeInstruction, TradeSide, WeightVector,
};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Everything the differ worked out for one portfolio and target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebalancePlan {
    pub total_value: f64,
    pub current_weights: WeightVector,
    /// Sells first, then buys; larger dollar changes first within each side.
    pub trades: Vec<TradeInstruction>,
    /// Instruments whose weight changes but which produced no trade.
    pub skipped: Vec<SkippedTrade>,
}

/// Diffs current holdings against a target allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioDiffer {
    min_trade_usd: f64,
}

impl PortfolioDiffer {
    pub fn new(min_trade_usd: f64) -> Self {
        Self { min_trade_usd }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.min_trade_usd.to_f64().unwrap_or_default())
    }

    pub fn min_trade_usd(&self) -> f64 {
        self.min_trade_usd
    }

    /// Computes the trades that move `holdings` to `target` at `last_prices`.
    ///
    /// Every instrument held or targeted is considered; cash is never traded.
    /// A worthless portfolio yields no trades.
    pub fn diff(
        &self,
        holdings: &Holdings,
        last_prices: &BTreeMap<String, f64>,
        target: &WeightVector,
    ) -> RebalancePlan {
        let valuation = value_holdings(holdings, last_prices);
        let tradable_value = valuation.total_value.max(0.0);

        let instruments: BTreeSet<&str> = holdings
            .positions()
            .keys()
            .map(String::as_str)
            .chain(target.instruments())
            .filter(|id| *id != CASH)
            .collect();

        let mut trades = Vec::new();
        let mut skipped = Vec::new();

        for id in instruments {
            let delta_weight = target.weight(id) - valuation.current_weights.weight(id);
            let delta_usd = delta_weight * tradable_value;

            let Some(price) = usable_price(last_prices, id) else {
                if delta_weight != 0.0 || holdings.quantity(id).is_some_and(|q| q != 0.0) {
                    tracing::warn!(instrument = id, "No usable price, skipping trade.");
                    skipped.push(SkippedTrade {
                        instrument: id.to_string(),
                        reason: SkipReason::MissingPrice,
                    });
                }
                continue;
            };

            if delta_usd.abs() < self.min_trade_usd || delta_usd == 0.0 {
                if delta_weight != 0.0 {
                    tracing::debug!(instrument = id, delta_usd, "Trade below minimum size.");
                    skipped.push(SkippedTrade {
                        instrument: id.to_string(),
                        reason: SkipReason::BelowMinimum { delta_usd },
                    });
                }
                continue;
            }

            trades.push(TradeInstruction {
                instrument: id.to_string(),
                side: TradeSide::from_delta(delta_usd),
                delta_usd,
                reference_price: price,
                est_quantity: delta_usd / price,
            });
        }

        trades.sort_by(|a, b| {
            a.side
                .execution_rank()
                .cmp(&b.side.execution_rank())
                .then_with(|| b.delta_usd.abs().total_cmp(&a.delta_usd.abs()))
                .then_with(|| a.instrument.cmp(&b.instrument))
        });

        tracing::debug!(
            total_value = valuation.total_value,
            trades = trades.len(),
            skipped = skipped.len(),
            "Computed rebalance plan."
        );

        RebalancePlan {
            total_value: valuation.total_value,
            current_weights: valuation.current_weights,
            trades,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn prices(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn weights(entries: &[(&str, f64)]) -> WeightVector {
        let mut target = WeightVector::new();
        for (id, w) in entries {
            target.set(*id, *w);
        }
        target
    }

    #[test]
    fn buys_into_target_from_cash() {
        let plan = PortfolioDiffer::new(25.0).diff(
            &Holdings::new(1_000.0),
            &prices(&[("AAPL", 100.0)]),
            &weights(&[("AAPL", 0.5), (CASH, 0.5)]),
        );

        assert_relative_eq!(plan.total_value, 1_000.0);
        assert_eq!(plan.trades.len(), 1);
        let trade = &plan.trades[0];
        assert_eq!(trade.instrument, "AAPL");
        assert_eq!(trade.side, TradeSide::Buy);
        assert_relative_eq!(trade.delta_usd, 500.0);
        assert_relative_eq!(trade.reference_price, 100.0);
        assert_relative_eq!(trade.est_quantity, 5.0);
    }

    #[test]
    fn missing_price_never_trades() {
        let plan = PortfolioDiffer::new(25.0).diff(
            &Holdings::new(1_000_000.0),
            &prices(&[("AAPL", 100.0)]),
            &weights(&[("AAPL", 0.2), ("Z", 0.8)]),
        );

        assert!(plan.trades.iter().all(|t| t.instrument != "Z"));
        assert_eq!(
            plan.skipped,
            vec![SkippedTrade {
                instrument: "Z".to_string(),
                reason: SkipReason::MissingPrice,
            }]
        );
    }

    #[test]
    fn sells_come_before_buys_largest_first() {
        let holdings = Holdings::new(0.0)
            .with_position("OLD1", 10.0)
            .with_position("OLD2", 30.0);
        let plan = PortfolioDiffer::new(25.0).diff(
            &holdings,
            &prices(&[("OLD1", 10.0), ("OLD2", 30.0), ("NEW1", 50.0), ("NEW2", 20.0)]),
            &weights(&[("NEW1", 0.7), ("NEW2", 0.3), (CASH, 0.0)]),
        );

        // total = 100 + 900 = 1000
        let order: Vec<(&str, TradeSide)> = plan
            .trades
            .iter()
            .map(|t| (t.instrument.as_str(), t.side))
            .collect();
        assert_eq!(
            order,
            vec![
                ("OLD2", TradeSide::Sell),
                ("OLD1", TradeSide::Sell),
                ("NEW1", TradeSide::Buy),
                ("NEW2", TradeSide::Buy),
            ]
        );
        assert_relative_eq!(plan.trades[0].est_quantity, -30.0, epsilon = 1e-9);
    }

    #[test]
    fn small_trades_are_dropped() {
        let holdings = Holdings::new(990.0).with_position("AAPL", 0.1);
        let plan = PortfolioDiffer::new(25.0).diff(
            &holdings,
            &prices(&[("AAPL", 100.0), ("MSFT", 100.0)]),
            &weights(&[("AAPL", 0.02), ("MSFT", 0.5), (CASH, 0.48)]),
        );

        // AAPL: 0.02 * 1000 - 10 = 10 dollars, under the minimum
        assert!(plan.trades.iter().all(|t| t.delta_usd.abs() >= 25.0));
        assert_eq!(plan.trades.len(), 1);
        assert_eq!(plan.trades[0].instrument, "MSFT");
        assert_eq!(plan.skipped.len(), 1);
        assert!(matches!(
            plan.skipped[0].reason,
            SkipReason::BelowMinimum { delta_usd } if (delta_usd - 10.0).abs() < 1e-9
        ));
    }

    #[test]
    fn equal_sized_trades_are_ordered_by_identifier() {
        let plan = PortfolioDiffer::new(1.0).diff(
            &Holdings::new(1_000.0),
            &prices(&[("BBB", 10.0), ("AAA", 20.0)]),
            &weights(&[("BBB", 0.25), ("AAA", 0.25), (CASH, 0.5)]),
        );

        let order: Vec<&str> = plan.trades.iter().map(|t| t.instrument.as_str()).collect();
        assert_eq!(order, vec!["AAA", "BBB"]);
    }

    #[test]
    fn worthless_portfolio_yields_no_trades() {
        let plan = PortfolioDiffer::new(0.0).diff(
            &Holdings::new(-50.0),
            &prices(&[("AAPL", 100.0)]),
            &weights(&[("AAPL", 1.0)]),
        );

        assert!(plan.trades.is_empty());
        assert_eq!(plan.current_weights.cash(), 0.0);
    }

    #[test]
    fn overdrawn_cash_does_not_become_a_sell() {
        let plan = PortfolioDiffer::new(25.0).diff(
            &Holdings::new(-500.0),
            &prices(&[("AAPL", 100.0)]),
            &weights(&[("AAPL", 1.0)]),
        );

        assert_eq!(plan.total_value, -500.0);
        assert!(plan.trades.is_empty());
        assert_eq!(
            plan.skipped,
            vec![SkippedTrade {
                instrument: "AAPL".to_string(),
                reason: SkipReason::BelowMinimum { delta_usd: 0.0 },
            }]
        );
    }

    #[test]
    fn cash_is_never_a_trade() {
        let plan = PortfolioDiffer::new(0.0).diff(
            &Holdings::new(1_000.0),
            &BTreeMap::new(),
            &WeightVector::all_cash(),
        );

        assert!(plan.trades.is_empty());
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn reads_minimum_from_config() {
        let config = StrategyConfig {
            min_trade_usd: dec!(12.5),
            ..StrategyConfig::default()
        };
        assert_eq!(PortfolioDiffer::from_config(&config).min_trade_usd(), 12.5);
    }
}
