use crate::error::ApiError;
use chrono::DateTime;
use core_types::PricePoint;
use serde::Deserialize;

// The chart API wraps everything in `{"chart": {"result": [...], "error": ...}}`.

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

/// Represents an error response from the chart API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Bar open times, seconds since the epoch.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    /// Exchange offset from UTC in seconds; bar dates are local to the exchange.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

impl ChartEnvelope {
    /// Extracts daily closes, preferring split/dividend-adjusted closes and
    /// falling back to raw closes. Bars with a null close are dropped.
    pub fn into_price_points(self) -> Result<Vec<PricePoint>, ApiError> {
        if let Some(error) = self.chart.error {
            return Err(ApiError::ApiError(format!("{}: {}", error.code, error.description)));
        }

        let result = self
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| ApiError::InvalidData("chart response has no result".to_string()))?;

        let closes = result
            .indicators
            .adjclose
            .into_iter()
            .next()
            .map(|a| a.adjclose)
            .filter(|closes| !closes.is_empty())
            .or_else(|| result.indicators.quote.into_iter().next().map(|q| q.close))
            .unwrap_or_default();

        if closes.len() != result.timestamp.len() {
            return Err(ApiError::InvalidData(format!(
                "{}: {} timestamps but {} closes",
                result.meta.symbol,
                result.timestamp.len(),
                closes.len()
            )));
        }

        let offset = result.meta.gmtoffset;
        result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| close.map(|price| (*ts, price)))
            .map(|(ts, price)| {
                let date = DateTime::from_timestamp(ts + offset, 0)
                    .ok_or_else(|| ApiError::InvalidData(format!("Invalid bar timestamp: {ts}")))?
                    .date_naive();
                Ok(PricePoint::new(date, price))
            })
            .collect()
    }
}
