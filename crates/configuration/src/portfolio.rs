use core_types::normalize_instrument;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Allowed number of instruments held at once.
pub const TOP_N_RANGE: RangeInclusive<usize> = 1..=50;
/// Allowed per-position cap, as a fraction of the portfolio.
pub const MAX_SINGLE_WEIGHT_RANGE: RangeInclusive<f64> = 0.01..=1.0;
/// A universe edit with fewer identifiers than this is rejected.
pub const MIN_UNIVERSE_SIZE: usize = 5;
/// Identifiers longer than this are dropped from universe edits.
pub const MAX_INSTRUMENT_LEN: usize = 10;

/// Liquid, large-cap names used until the user edits the universe.
const DEFAULT_UNIVERSE: [&str; 30] = [
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "BRK-B", "JPM", "LLY", "AVGO", "XOM", "UNH",
    "V", "PG", "MA", "COST", "HD", "MRK", "ADBE", "PEP", "KO", "WMT", "CRM", "ABBV", "BAC", "TMO",
    "CSCO", "ACN", "MCD", "NFLX",
];

/// The user-editable portfolio settings, as kept in the settings store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSettings {
    /// Ordered, de-duplicated instrument identifiers to screen.
    pub universe: Vec<String>,
    /// How many top-ranked instruments to hold.
    pub top_n: usize,
    /// Per-position cap.
    pub max_single_weight: f64,
    /// Nominal capital, informational only.
    pub capital_usd: Decimal,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        Self {
            universe: DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
            top_n: 8,
            max_single_weight: 0.20,
            capital_usd: dec!(10000),
        }
    }
}

/// A partial edit coming from the presentation layer. Numbers arrive loosely
/// typed (`top_n` may be `"8.0"` in a form) and are range-checked on apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    /// Comma-separated identifiers.
    #[serde(default)]
    pub universe: Option<String>,
    #[serde(default)]
    pub top_n: Option<f64>,
    #[serde(default)]
    pub max_single_weight: Option<f64>,
    #[serde(default)]
    pub capital_usd: Option<Decimal>,
}

impl PortfolioSettings {
    /// Forces every field into its valid range. Values read back from storage
    /// go through this too, so an out-of-range value never reaches a run.
    pub fn clamped(mut self) -> Self {
        self.top_n = self.top_n.clamp(*TOP_N_RANGE.start(), *TOP_N_RANGE.end());
        self.max_single_weight = if self.max_single_weight.is_finite() {
            self.max_single_weight
                .clamp(*MAX_SINGLE_WEIGHT_RANGE.start(), *MAX_SINGLE_WEIGHT_RANGE.end())
        } else {
            PortfolioSettings::default().max_single_weight
        };
        self.capital_usd = self.capital_usd.max(Decimal::ZERO);
        self.universe = dedup_identifiers(self.universe.iter().map(String::as_str));
        self
    }

    /// Applies a user edit, clamping numbers and rejecting unusable universes.
    ///
    /// Returns one human-readable line per field that was adjusted or ignored;
    /// an empty list means the edit was taken as given.
    pub fn apply(&mut self, update: &SettingsUpdate) -> Vec<String> {
        let mut adjustments = Vec::new();

        if let Some(raw) = update.universe.as_deref().filter(|raw| !raw.trim().is_empty()) {
            let universe = parse_universe(raw);
            if universe.len() >= MIN_UNIVERSE_SIZE {
                self.universe = universe;
            } else {
                adjustments.push(format!(
                    "universe ignored: {} usable identifiers, at least {} required",
                    universe.len(),
                    MIN_UNIVERSE_SIZE
                ));
            }
        }

        if let Some(top_n) = update.top_n {
            if top_n.is_finite() {
                let requested = top_n.trunc().max(0.0) as usize;
                let clamped = requested.clamp(*TOP_N_RANGE.start(), *TOP_N_RANGE.end());
                if clamped as f64 != top_n {
                    adjustments.push(format!("top_n {top_n} adjusted to {clamped}"));
                }
                self.top_n = clamped;
            } else {
                adjustments.push(format!("top_n ignored: {top_n} is not a number"));
            }
        }

        if let Some(weight) = update.max_single_weight {
            if weight.is_finite() {
                let clamped =
                    weight.clamp(*MAX_SINGLE_WEIGHT_RANGE.start(), *MAX_SINGLE_WEIGHT_RANGE.end());
                if clamped != weight {
                    adjustments.push(format!("max_single_weight {weight} adjusted to {clamped}"));
                }
                self.max_single_weight = clamped;
            } else {
                adjustments.push(format!("max_single_weight ignored: {weight} is not a number"));
            }
        }

        if let Some(capital) = update.capital_usd {
            if capital.is_sign_negative() && !capital.is_zero() {
                adjustments.push(format!("capital_usd {capital} adjusted to 0"));
            }
            self.capital_usd = capital.max(Decimal::ZERO);
        }

        adjustments
    }
}

/// Parses a comma-separated universe edit into normalised identifiers.
pub fn parse_universe(raw: &str) -> Vec<String> {
    dedup_identifiers(raw.split(','))
}

fn dedup_identifiers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.map(normalize_instrument)
        .filter(|id| !id.is_empty() && id.len() <= MAX_INSTRUMENT_LEN)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
