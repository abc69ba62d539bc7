use configuration::PortfolioSettings;
use core_types::{CASH, WeightVector};
use std::collections::HashSet;

/// Builds capped, equal-weight target allocations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationBuilder {
    max_single_weight: f64,
    top_n: usize,
}

impl AllocationBuilder {
    pub fn new(max_single_weight: f64, top_n: usize) -> Self {
        Self {
            max_single_weight,
            top_n,
        }
    }

    pub fn from_settings(settings: &PortfolioSettings) -> Self {
        Self::new(settings.max_single_weight, settings.top_n)
    }

    /// Allocates across the first `top_n` distinct identifiers of `selection`.
    ///
    /// The result always contains `CASH` and sums to 1. An empty selection, a
    /// zero holding count or an unusable cap all give `{CASH: 1.0}`.
    pub fn build(&self, selection: &[String]) -> WeightVector {
        let mut seen = HashSet::new();
        let chosen: Vec<&str> = selection
            .iter()
            .map(String::as_str)
            .filter(|id| !id.is_empty() && *id != CASH)
            .filter(|id| seen.insert(*id))
            .take(self.top_n)
            .collect();

        if chosen.is_empty() || !self.max_single_weight.is_finite() || self.max_single_weight <= 0.0 {
            tracing::debug!(
                selected = chosen.len(),
                cap = self.max_single_weight,
                "Allocating everything to cash."
            );
            return WeightVector::all_cash();
        }

        let base = 1.0 / chosen.len() as f64;
        let capped = base.min(self.max_single_weight);
        let alloc_sum = capped * chosen.len() as f64;
        if alloc_sum <= 0.0 {
            return WeightVector::all_cash();
        }

        // Renormalise the capped weights, then scale back down so a binding
        // cap leaves its excess in cash.
        let weight = (capped / alloc_sum) * alloc_sum.min(1.0);

        let mut target = WeightVector::new();
        for id in &chosen {
            target.set(*id, weight);
        }
        let invested = weight * chosen.len() as f64;
        target.set(CASH, (1.0 - invested).max(0.0));

        tracing::debug!(positions = chosen.len(), weight, cash = target.cash(), "Built target allocation.");
        target
    }
}
