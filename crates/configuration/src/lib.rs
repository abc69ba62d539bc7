use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod portfolio;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use portfolio::{PortfolioSettings, SettingsUpdate, parse_universe};
pub use settings::{
    Config, DatabaseConfig, DefaultsConfig, LoggingConfig, PriceProviderConfig, ScheduleConfig,
    ServerConfig, StrategyConfig,
};

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It reads the configuration file,
/// deserializes it into our strongly-typed `Config` struct, and returns it.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Loads configuration from `path`, layering `REBALANCER__SECTION__KEY`
/// environment variables on top. A missing file falls back to defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("REBALANCER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

/// Rejects strategy parameters no run could work with.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let strategy = &config.strategy;
    if strategy.momentum_lookback_days == 0 {
        return Err(ConfigError::ValidationError(
            "strategy.momentum_lookback_days must be at least 1".to_string(),
        ));
    }
    if strategy.volatility_lookback_days < 2 {
        return Err(ConfigError::ValidationError(
            "strategy.volatility_lookback_days must be at least 2".to_string(),
        ));
    }
    if strategy.min_price.is_sign_negative() || strategy.min_trade_usd.is_sign_negative() {
        return Err(ConfigError::ValidationError(
            "strategy.min_price and strategy.min_trade_usd must not be negative".to_string(),
        ));
    }
    let required = min_history_days(strategy);
    if strategy.history_days < required {
        return Err(ConfigError::ValidationError(format!(
            "strategy.history_days is {} but the lookbacks need at least {required}",
            strategy.history_days
        )));
    }
    Ok(())
}

/// Shortest calendar window that can still yield a ranking: one year, or the
/// longest lookback plus a five-day margin converted from trading days.
pub fn min_history_days(strategy: &StrategyConfig) -> u32 {
    const MIN_TRAILING_DAYS: u32 = 365;
    let trading_days = strategy
        .momentum_lookback_days
        .max(strategy.volatility_lookback_days)
        .saturating_add(5);
    let calendar_days = trading_days.saturating_mul(365).div_ceil(252);
    u32::try_from(calendar_days)
        .unwrap_or(u32::MAX)
        .max(MIN_TRAILING_DAYS)
}
