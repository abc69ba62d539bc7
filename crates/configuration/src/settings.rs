use crate::portfolio::PortfolioSettings;
use chrono::{NaiveTime, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so a `config.toml` only needs to name what it changes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub strategy: StrategyConfig,
    pub defaults: DefaultsConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
    pub price_provider: PriceProviderConfig,
}

/// Parameters of the momentum/volatility screen and the trade de-noising threshold.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Trading days over which momentum (total return) is measured. ~6 months.
    pub momentum_lookback_days: usize,
    /// Trading days of daily returns used for realised volatility. ~3 months.
    pub volatility_lookback_days: usize,
    /// Instruments whose latest price is below this are never ranked.
    pub min_price: Decimal,
    /// Trades smaller than this many dollars are dropped from the plan.
    pub min_trade_usd: Decimal,
    /// Calendar days of history requested from the price provider.
    pub history_days: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            momentum_lookback_days: 126,
            volatility_lookback_days: 63,
            min_price: dec!(5.0),
            min_trade_usd: dec!(25.0),
            history_days: 365,
        }
    }
}

/// Values used to seed the settings and holdings stores on first start.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub universe: Vec<String>,
    pub top_n: usize,
    pub max_single_weight: f64,
    pub capital_usd: Decimal,
    /// Opening `CASH` balance of the paper portfolio.
    pub initial_cash: Decimal,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let settings = PortfolioSettings::default();
        Self {
            universe: settings.universe,
            top_n: settings.top_n,
            max_single_weight: settings.max_single_weight,
            capital_usd: settings.capital_usd,
            initial_cash: dec!(10000),
        }
    }
}

impl DefaultsConfig {
    /// The seed settings, clamped into their valid ranges.
    pub fn portfolio_settings(&self) -> PortfolioSettings {
        PortfolioSettings {
            universe: self.universe.clone(),
            top_n: self.top_n,
            max_single_weight: self.max_single_weight,
            capital_usd: self.capital_usd,
        }
        .clamped()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection string, e.g. `sqlite://rebalancer.db`.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://rebalancer.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// When the weekly recommendation run fires.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub weekday: Weekday,
    /// Time of day in UTC. 14:35 UTC is shortly after the US open.
    pub time_utc: NaiveTime,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weekday: Weekday::Mon,
            time_utc: NaiveTime::from_hms_opt(14, 35, 0).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Directory for the daily rolling log file.
    pub directory: PathBuf,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: PathBuf::from("logs"),
            file_prefix: "rebalancer.log".to_string(),
        }
    }
}

/// Settings for the HTTP price-history provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PriceProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for PriceProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 20,
            user_agent: "Mozilla/5.0 (compatible; rebalancer/0.1)".to_string(),
        }
    }
}
