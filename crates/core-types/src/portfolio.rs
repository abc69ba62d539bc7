use crate::error::CoreError;
use crate::ids::{CASH, normalize_instrument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current holdings: instrument quantities plus the uninvested cash balance.
///
/// On the wire this is a flat `{ "AAPL": 10.0, "CASH": 2500.0 }` map, which is
/// also how the holdings store keys it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct Holdings {
    cash: f64,
    positions: BTreeMap<String, f64>,
}

impl Holdings {
    /// Creates holdings consisting of cash only.
    pub fn new(cash: f64) -> Self {
        Self {
            cash,
            positions: BTreeMap::new(),
        }
    }

    /// Builds holdings from raw `(identifier, quantity)` rows. Identifiers are
    /// normalised; the `CASH` row becomes the cash balance. Blank identifiers
    /// and non-finite quantities are dropped.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut holdings = Self::default();
        for (instrument, quantity) in entries {
            // Rows that cannot be represented are skipped, not fatal.
            let _ = holdings.set(instrument.as_ref(), quantity);
        }
        holdings
    }

    pub fn with_position(mut self, instrument: &str, quantity: f64) -> Self {
        let _ = self.set(instrument, quantity);
        self
    }

    /// Sets the quantity held for one instrument (or the cash balance).
    pub fn set(&mut self, instrument: &str, quantity: f64) -> Result<(), CoreError> {
        let id = normalize_instrument(instrument);
        if id.is_empty() {
            return Err(CoreError::EmptyInstrument);
        }
        if !quantity.is_finite() {
            return Err(CoreError::InvalidInput(id, format!("quantity {quantity} is not finite")));
        }

        if id == CASH {
            self.cash = quantity;
        } else {
            self.positions.insert(id, quantity);
        }
        Ok(())
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Non-cash positions, keyed by normalised identifier.
    pub fn positions(&self) -> &BTreeMap<String, f64> {
        &self.positions
    }

    pub fn quantity(&self, instrument: &str) -> Option<f64> {
        if instrument == CASH {
            Some(self.cash)
        } else {
            self.positions.get(instrument).copied()
        }
    }
}

impl From<BTreeMap<String, f64>> for Holdings {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self::from_entries(map)
    }
}

impl From<Holdings> for BTreeMap<String, f64> {
    fn from(holdings: Holdings) -> Self {
        let mut map = holdings.positions;
        map.insert(CASH.to_string(), holdings.cash);
        map
    }
}

/// Portfolio fractions per instrument, with cash under the `CASH` key.
///
/// Target vectors produced by the allocation step sum to 1 within 1e-9; a
/// current-weight vector of an empty or worthless portfolio is all zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(BTreeMap<String, f64>);

impl WeightVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fully uninvested allocation `{CASH: 1.0}`.
    pub fn all_cash() -> Self {
        let mut weights = Self::new();
        weights.set(CASH, 1.0);
        weights
    }

    pub fn set(&mut self, instrument: impl Into<String>, weight: f64) {
        self.0.insert(instrument.into(), weight);
    }

    pub fn get(&self, instrument: &str) -> Option<f64> {
        self.0.get(instrument).copied()
    }

    /// The weight for `instrument`, zero when absent.
    pub fn weight(&self, instrument: &str) -> f64 {
        self.get(instrument).unwrap_or(0.0)
    }

    pub fn cash(&self) -> f64 {
        self.weight(CASH)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Identifiers carrying a weight, cash excluded.
    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str).filter(|id| *id != CASH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cash_row_is_split_out_and_keys_normalised() {
        let holdings = Holdings::from_entries([("cash", 1_000.0), ("aapl", 3.0), (" ", 9.0)]);
        assert_eq!(holdings.cash(), 1_000.0);
        assert_eq!(holdings.quantity("AAPL"), Some(3.0));
        assert_eq!(holdings.positions().len(), 1);
    }

    #[test]
    fn rejects_non_finite_quantities() {
        let mut holdings = Holdings::new(0.0);
        assert!(holdings.set("MSFT", f64::INFINITY).is_err());
        assert_eq!(holdings.set("", 1.0), Err(CoreError::EmptyInstrument));
    }

    #[test]
    fn holdings_round_trip_as_flat_map() {
        let holdings = Holdings::new(250.0).with_position("NVDA", 1.5);
        let json = serde_json::to_value(&holdings).unwrap();
        assert_eq!(json, serde_json::json!({ "CASH": 250.0, "NVDA": 1.5 }));
        let back: Holdings = serde_json::from_value(json).unwrap();
        assert_eq!(back, holdings);
    }

    #[test]
    fn all_cash_vector() {
        let weights = WeightVector::all_cash();
        assert_eq!(weights.cash(), 1.0);
        assert_eq!(weights.instruments().count(), 0);
        assert_eq!(weights.weight("AAPL"), 0.0);
    }
}
