use core_types::{CASH, Holdings, WeightVector};
use std::collections::BTreeMap;

/// A portfolio measured at a set of reference prices.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    /// Cash plus the market value of every priced position.
    pub total_value: f64,
    /// Fractions of `total_value`, including `CASH`. All zero when the
    /// portfolio is worth nothing.
    pub current_weights: WeightVector,
}

/// A price an instrument can be valued or traded at.
pub(crate) fn usable_price(last_prices: &BTreeMap<String, f64>, instrument: &str) -> Option<f64> {
    last_prices
        .get(instrument)
        .copied()
        .filter(|p| p.is_finite() && *p > 0.0)
}

/// Values `holdings` at `last_prices`. Positions without a usable price are
/// left out of both the total and the weights.
pub fn value_holdings(holdings: &Holdings, last_prices: &BTreeMap<String, f64>) -> Valuation {
    let priced: Vec<(&str, f64)> = holdings
        .positions()
        .iter()
        .filter_map(|(id, quantity)| {
            usable_price(last_prices, id).map(|price| (id.as_str(), quantity * price))
        })
        .collect();

    let total_value = holdings.cash() + priced.iter().map(|(_, value)| value).sum::<f64>();

    let mut current_weights = WeightVector::new();
    if total_value > 0.0 {
        current_weights.set(CASH, holdings.cash() / total_value);
        for (id, value) in priced {
            current_weights.set(id, value / total_value);
        }
    } else {
        current_weights.set(CASH, 0.0);
        for (id, _) in priced {
            current_weights.set(id, 0.0);
        }
    }

    Valuation {
        total_value,
        current_weights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn prices(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn values_cash_and_priced_positions() {
        let holdings = Holdings::new(500.0)
            .with_position("AAPL", 2.0)
            .with_position("MSFT", 1.0);
        let valuation = value_holdings(&holdings, &prices(&[("AAPL", 100.0), ("MSFT", 300.0)]));

        assert_relative_eq!(valuation.total_value, 1_000.0);
        assert_relative_eq!(valuation.current_weights.cash(), 0.5);
        assert_relative_eq!(valuation.current_weights.weight("AAPL"), 0.2);
        assert_relative_eq!(valuation.current_weights.weight("MSFT"), 0.3);
    }

    #[test]
    fn unpriced_positions_are_left_out() {
        let holdings = Holdings::new(100.0)
            .with_position("AAPL", 1.0)
            .with_position("GONE", 50.0)
            .with_position("ZERO", 5.0);
        let valuation = value_holdings(&holdings, &prices(&[("AAPL", 100.0), ("ZERO", 0.0)]));

        assert_relative_eq!(valuation.total_value, 200.0);
        assert_eq!(valuation.current_weights.get("GONE"), None);
        assert_eq!(valuation.current_weights.get("ZERO"), None);
    }

    #[test]
    fn worthless_portfolio_has_zero_weights() {
        let holdings = Holdings::new(0.0).with_position("AAPL", 0.0);
        let valuation = value_holdings(&holdings, &prices(&[("AAPL", 100.0)]));

        assert_eq!(valuation.total_value, 0.0);
        assert_eq!(valuation.current_weights.cash(), 0.0);
        assert_eq!(valuation.current_weights.weight("AAPL"), 0.0);
    }
}
