//! # API Client
//!
//! Fetches daily price history over HTTP from a Yahoo-Finance-compatible
//! chart endpoint and assembles it into a `PriceSeries`.
//!
//! A failed instrument is logged and left out; the caller decides what an
//! empty or partial series means.

use crate::error::ApiError;
use chrono::{NaiveDate, NaiveTime};
use configuration::PriceProviderConfig;
use core_types::{PricePoint, PriceSeries};
use futures::future::join_all;
use std::time::Duration;

pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::ChartEnvelope;

/// Client for the `/v8/finance/chart/{symbol}` endpoint.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(config: &PriceProviderConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the daily closes of one instrument for `[start, end]`.
    pub async fn fetch_daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, ApiError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<ChartEnvelope>(&text) {
            Ok(envelope) => envelope.into_price_points(),
            Err(_) if !status.is_success() => Err(ApiError::ApiError(format!(
                "{symbol}: HTTP {status}"
            ))),
            Err(e) => Err(ApiError::Deserialization(e.to_string())),
        }
    }

    /// Fetches `[start, end]` for every symbol concurrently. Symbols that fail
    /// or return no bars are logged and omitted from the result.
    pub async fn fetch_history(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError> {
        if start > end {
            return Err(ApiError::InvalidData(format!(
                "history range starts after it ends: {start} > {end}"
            )));
        }

        let fetches = symbols
            .iter()
            .map(|symbol| self.fetch_daily_closes(symbol, start, end));
        let results = join_all(fetches).await;

        let mut series = PriceSeries::new();
        let mut failed = 0usize;
        for (symbol, result) in symbols.iter().zip(results) {
            match result {
                Ok(points) if !points.is_empty() => series.insert(symbol, points),
                Ok(_) => {
                    tracing::warn!(%symbol, "No bars returned, skipping instrument.");
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(%symbol, error = %e, "Failed to fetch price history, skipping instrument.");
                }
            }
        }

        tracing::info!(
            requested = symbols.len(),
            received = series.len(),
            failed,
            "Price history download complete."
        );
        Ok(series)
    }
}
