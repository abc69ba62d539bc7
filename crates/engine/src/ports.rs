use crate::error::PortError;
use async_trait::async_trait;
use chrono::NaiveDate;
use configuration::PortfolioSettings;
use core_types::{Holdings, PriceSeries, RecommendationSnapshot};

/// Source of daily price history.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Fetches `[start, end]` for `instruments`. May return a subset of the
    /// instruments, or nothing at all.
    async fn fetch(
        &self,
        instruments: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, PortError>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The current, range-checked portfolio settings.
    async fn portfolio_settings(&self) -> Result<PortfolioSettings, PortError>;
}

#[async_trait]
pub trait HoldingsStore: Send + Sync {
    async fn holdings(&self) -> Result<Holdings, PortError>;
}

/// Append-only archive of finished runs.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn append(&self, snapshot: &RecommendationSnapshot) -> Result<(), PortError>;
}
