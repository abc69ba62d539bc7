use crate::error::SignalError;
use crate::metrics;
use configuration::StrategyConfig;
use core_types::{Exclusion, ExclusionReason, PriceSeries, Signal, SignalOutcome};
use rust_decimal::prelude::ToPrimitive;

/// Extra aligned trading days required beyond the longest lookback.
pub const HISTORY_MARGIN_DAYS: usize = 5;

/// The validated inputs of a ranking pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalParams {
    /// Trading days between the momentum reference price and the latest price.
    pub momentum_lookback: usize,
    /// Number of trailing daily returns in the volatility estimate.
    pub volatility_lookback: usize,
    /// Latest-price floor.
    pub min_price: f64,
}

/// The result of one ranking pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    pub outcome: SignalOutcome,
    /// Sorted by score descending, then identifier ascending.
    pub signals: Vec<Signal>,
    /// Sorted by identifier.
    pub exclusions: Vec<Exclusion>,
}

impl SignalSet {
    fn insufficient(available: usize, required: usize) -> Self {
        Self {
            outcome: SignalOutcome::InsufficientHistory { available, required },
            signals: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    /// The identifiers of the `n` best-ranked instruments.
    pub fn top(&self, n: usize) -> Vec<String> {
        self.signals.iter().take(n).map(|s| s.instrument.clone()).collect()
    }
}

/// Ranks instruments by momentum over volatility.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    params: SignalParams,
}

impl SignalEngine {
    /// Creates a new `SignalEngine`, rejecting parameters no ranking could use.
    pub fn new(params: SignalParams) -> Result<Self, SignalError> {
        if params.momentum_lookback == 0 {
            return Err(SignalError::InvalidParameters(
                "momentum lookback must be at least 1 day".to_string(),
            ));
        }
        if params.volatility_lookback < 2 {
            return Err(SignalError::InvalidParameters(
                "volatility lookback must be at least 2 days".to_string(),
            ));
        }
        if !params.min_price.is_finite() || params.min_price < 0.0 {
            return Err(SignalError::InvalidParameters(format!(
                "minimum price must be a non-negative number, got {}",
                params.min_price
            )));
        }
        Ok(Self { params })
    }

    pub fn from_config(config: &StrategyConfig) -> Result<Self, SignalError> {
        let min_price = config.min_price.to_f64().ok_or_else(|| {
            SignalError::InvalidParameters(format!("minimum price {} is out of range", config.min_price))
        })?;
        Self::new(SignalParams {
            momentum_lookback: config.momentum_lookback_days,
            volatility_lookback: config.volatility_lookback_days,
            min_price,
        })
    }

    pub fn params(&self) -> &SignalParams {
        &self.params
    }

    /// Trading days of aligned history a ranking needs.
    pub fn required_history(&self) -> usize {
        self.longest_lookback() + HISTORY_MARGIN_DAYS
    }

    fn longest_lookback(&self) -> usize {
        self.params.momentum_lookback.max(self.params.volatility_lookback)
    }

    /// Ranks every instrument in `prices`.
    ///
    /// All instruments are measured on the union calendar of the input, so
    /// "now" is the latest date any instrument traded. An instrument missing a
    /// price anywhere in the lookback window is excluded rather than filled.
    pub fn rank(&self, prices: &PriceSeries) -> SignalSet {
        let calendar = prices.trading_dates();
        let required = self.required_history();
        if calendar.len() < required {
            tracing::info!(
                available = calendar.len(),
                required,
                "Not enough price history to rank instruments."
            );
            return SignalSet::insufficient(calendar.len(), required);
        }

        let mut signals = Vec::new();
        let mut exclusions = Vec::new();

        for instrument in prices.instruments() {
            let aligned = prices.aligned(instrument, &calendar);
            match self.evaluate(&aligned) {
                Ok((momentum, volatility, score)) => {
                    tracing::debug!(instrument, momentum, volatility, score, "Ranked instrument.");
                    signals.push(Signal {
                        instrument: instrument.to_string(),
                        momentum,
                        volatility,
                        score,
                    });
                }
                Err(reason) => {
                    tracing::debug!(instrument, ?reason, "Excluded instrument.");
                    exclusions.push(Exclusion {
                        instrument: instrument.to_string(),
                        reason,
                    });
                }
            }
        }

        signals.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.instrument.cmp(&b.instrument))
        });
        exclusions.sort_by(|a, b| a.instrument.cmp(&b.instrument));

        let outcome = if signals.is_empty() {
            SignalOutcome::NoEligibleInstruments
        } else {
            SignalOutcome::Ranked
        };

        tracing::info!(
            ranked = signals.len(),
            excluded = exclusions.len(),
            "Ranking complete."
        );

        SignalSet {
            outcome,
            signals,
            exclusions,
        }
    }

    /// Scores one instrument aligned to the calendar. The calendar is at least
    /// `required_history()` long when this is called.
    fn evaluate(&self, aligned: &[Option<f64>]) -> Result<(f64, f64, f64), ExclusionReason> {
        let latest = aligned
            .iter()
            .rev()
            .find_map(|p| *p)
            .ok_or(ExclusionReason::MissingData)?;
        if latest <= 0.0 {
            return Err(ExclusionReason::InvalidPrice);
        }
        if latest < self.params.min_price {
            return Err(ExclusionReason::BelowMinPrice { price: latest });
        }

        let window_start = aligned.len() - 1 - self.longest_lookback();
        let window = aligned[window_start..]
            .iter()
            .copied()
            .collect::<Option<Vec<f64>>>()
            .ok_or(ExclusionReason::MissingData)?;
        if window.iter().any(|p| *p <= 0.0) {
            return Err(ExclusionReason::InvalidPrice);
        }

        let now = window.len() - 1;
        let momentum = metrics::momentum(window[now - self.params.momentum_lookback], window[now]);

        let returns = metrics::daily_returns(&window[now - self.params.volatility_lookback..]);
        let volatility =
            metrics::annualised_volatility(&returns).ok_or(ExclusionReason::ZeroVolatility)?;
        if volatility == 0.0 {
            return Err(ExclusionReason::ZeroVolatility);
        }

        let score = momentum / volatility;
        if !momentum.is_finite() || !score.is_finite() {
            return Err(ExclusionReason::NonFiniteScore);
        }

        Ok((momentum, volatility, score))
    }
}
