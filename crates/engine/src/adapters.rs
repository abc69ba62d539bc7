//! Port implementations for the production collaborators.

use crate::error::PortError;
use crate::ports::{HoldingsStore, PriceHistoryProvider, SettingsStore, SnapshotStore};
use api_client::YahooClient;
use async_trait::async_trait;
use chrono::NaiveDate;
use configuration::PortfolioSettings;
use core_types::{Holdings, PriceSeries, RecommendationSnapshot};
use database::DbRepository;

#[async_trait]
impl PriceHistoryProvider for YahooClient {
    async fn fetch(
        &self,
        instruments: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, PortError> {
        Ok(self.fetch_history(instruments, start, end).await?)
    }
}

#[async_trait]
impl SettingsStore for DbRepository {
    async fn portfolio_settings(&self) -> Result<PortfolioSettings, PortError> {
        Ok(DbRepository::portfolio_settings(self).await?)
    }
}

#[async_trait]
impl HoldingsStore for DbRepository {
    async fn holdings(&self) -> Result<Holdings, PortError> {
        Ok(DbRepository::holdings(self).await?)
    }
}

#[async_trait]
impl SnapshotStore for DbRepository {
    async fn append(&self, snapshot: &RecommendationSnapshot) -> Result<(), PortError> {
        Ok(self.save_recommendation(snapshot).await?)
    }
}
