use crate::DbError;
use chrono::{DateTime, SecondsFormat, Utc};
use configuration::{DefaultsConfig, PortfolioSettings, SettingsUpdate};
use core_types::{CASH, Holdings, RecommendationSnapshot, normalize_instrument};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

const KEY_UNIVERSE: &str = "universe";
const KEY_TOP_N: &str = "top_n";
const KEY_MAX_SINGLE_WEIGHT: &str = "max_single_weight";
const KEY_CAPITAL_USD: &str = "capital_usd";

const UPSERT_HOLDING: &str = "INSERT OR REPLACE INTO holdings (ticker, shares) VALUES (?, ?)";

/// Normalises the identifier and rejects entries that cannot be stored.
fn validated_holding(instrument: &str, quantity: f64) -> Result<String, DbError> {
    let ticker = normalize_instrument(instrument);
    if ticker.is_empty() {
        return Err(DbError::InvalidRecord("instrument identifier is empty".to_string()));
    }
    if !quantity.is_finite() {
        return Err(DbError::InvalidRecord(format!(
            "quantity for {ticker} must be a finite number"
        )));
    }
    Ok(ticker)
}

/// The storage key of a snapshot: an RFC 3339 UTC timestamp with fixed
/// microsecond precision, so lexical order is chronological order.
pub fn snapshot_key(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ---===[ Seeding ]===---

    /// Writes the configured defaults for every setting that is not stored
    /// yet, and opens the paper portfolio with `initial_cash` if it has no
    /// cash row. Existing values are never overwritten.
    pub async fn seed_defaults(&self, defaults: &DefaultsConfig) -> Result<(), DbError> {
        let settings = defaults.portfolio_settings();
        let initial_cash = defaults.initial_cash.to_f64().unwrap_or_default();

        let mut tx = self.pool.begin().await?;
        for (key, value) in encode_settings(&settings)? {
            sqlx::query("INSERT OR IGNORE INTO settings (k, v) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("INSERT OR IGNORE INTO holdings (ticker, shares) VALUES (?, ?)")
            .bind(CASH)
            .bind(initial_cash)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!("Seeded default settings and holdings.");
        Ok(())
    }

    // ---===[ Settings ]===---

    /// Reads the portfolio settings. Missing or unparseable values fall back
    /// to their defaults; the result is always clamped into range.
    pub async fn portfolio_settings(&self) -> Result<PortfolioSettings, DbError> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT k, v FROM settings")
            .fetch_all(&self.pool)
            .await?;
        let stored: HashMap<String, String> = rows.into_iter().collect();
        let defaults = PortfolioSettings::default();

        let universe = stored
            .get(KEY_UNIVERSE)
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .filter(|universe| !universe.is_empty())
            .unwrap_or(defaults.universe);
        let top_n = stored
            .get(KEY_TOP_N)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .map(|n| n.trunc().max(0.0) as usize)
            .unwrap_or(defaults.top_n);
        let max_single_weight = stored
            .get(KEY_MAX_SINGLE_WEIGHT)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or(defaults.max_single_weight);
        let capital_usd = stored
            .get(KEY_CAPITAL_USD)
            .and_then(|raw| Decimal::from_str(raw.trim()).ok())
            .unwrap_or(defaults.capital_usd);

        Ok(PortfolioSettings {
            universe,
            top_n,
            max_single_weight,
            capital_usd,
        }
        .clamped())
    }

    /// Stores every setting, clamped into range.
    pub async fn save_portfolio_settings(&self, settings: &PortfolioSettings) -> Result<(), DbError> {
        let settings = settings.clone().clamped();
        let mut tx = self.pool.begin().await?;
        for (key, value) in encode_settings(&settings)? {
            sqlx::query("INSERT OR REPLACE INTO settings (k, v) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Applies a user edit to the stored settings. Returns the settings now in
    /// effect and a note for every field that was adjusted or ignored.
    pub async fn update_portfolio_settings(
        &self,
        update: &SettingsUpdate,
    ) -> Result<(PortfolioSettings, Vec<String>), DbError> {
        let mut settings = self.portfolio_settings().await?;
        let adjustments = settings.apply(update);
        self.save_portfolio_settings(&settings).await?;

        for note in &adjustments {
            tracing::warn!(adjustment = %note, "Settings edit adjusted.");
        }
        Ok((settings, adjustments))
    }

    // ---===[ Holdings ]===---

    pub async fn holdings(&self) -> Result<Holdings, DbError> {
        let rows: Vec<(String, f64)> = sqlx::query_as("SELECT ticker, shares FROM holdings")
            .fetch_all(&self.pool)
            .await?;
        Ok(Holdings::from_entries(rows))
    }

    /// Sets the quantity held for one instrument, or the cash balance when the
    /// identifier is `CASH`. Identifiers are normalised before storage.
    pub async fn upsert_holding(&self, instrument: &str, quantity: f64) -> Result<(), DbError> {
        let ticker = validated_holding(instrument, quantity)?;

        sqlx::query(UPSERT_HOLDING)
            .bind(&ticker)
            .bind(quantity)
            .execute(&self.pool)
            .await?;

        tracing::info!(instrument = %ticker, quantity, "Holding updated.");
        Ok(())
    }

    /// Sets several holdings at once. Either every entry is written or, when
    /// any entry is invalid or a write fails, none is.
    pub async fn upsert_holdings(&self, entries: &BTreeMap<String, f64>) -> Result<(), DbError> {
        let validated = entries
            .iter()
            .map(|(instrument, quantity)| -> Result<(String, f64), DbError> {
                Ok((validated_holding(instrument, *quantity)?, *quantity))
            })
            .collect::<Result<Vec<(String, f64)>, DbError>>()?;

        let mut tx = self.pool.begin().await?;
        for (ticker, quantity) in &validated {
            sqlx::query(UPSERT_HOLDING)
                .bind(ticker)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!(count = validated.len(), "Holdings updated.");
        Ok(())
    }

    // ---===[ Recommendations ]===---

    /// Appends a snapshot. Two snapshots with the same timestamp key keep the
    /// later write.
    pub async fn save_recommendation(&self, snapshot: &RecommendationSnapshot) -> Result<(), DbError> {
        let key = snapshot_key(&snapshot.timestamp);
        let payload = serde_json::to_string(snapshot)?;

        sqlx::query("INSERT OR REPLACE INTO recommendations (ts, run_id, payload) VALUES (?, ?, ?)")
            .bind(&key)
            .bind(snapshot.run_id.to_string())
            .bind(payload)
            .execute(&self.pool)
            .await?;

        tracing::debug!(ts = %key, run_id = %snapshot.run_id, "Saved recommendation snapshot.");
        Ok(())
    }

    /// The most recent snapshot, if any run has completed.
    pub async fn latest_recommendation(&self) -> Result<Option<RecommendationSnapshot>, DbError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT payload FROM recommendations ORDER BY ts DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(payload,)| serde_json::from_str(&payload).map_err(DbError::from))
            .transpose()
    }
}

fn encode_settings(settings: &PortfolioSettings) -> Result<Vec<(&'static str, String)>, DbError> {
    Ok(vec![
        (KEY_UNIVERSE, serde_json::to_string(&settings.universe)?),
        (KEY_TOP_N, settings.top_n.to_string()),
        (KEY_MAX_SINGLE_WEIGHT, settings.max_single_weight.to_string()),
        (KEY_CAPITAL_USD, settings.capital_usd.to_string()),
    ])
}
