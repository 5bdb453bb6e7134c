//! Application configuration management.

use serde::Deserialize;

use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Asset engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Asset engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Currency of companies created without an explicit currency.
    #[serde(default = "default_company_currency")]
    pub company_currency: Currency,
    /// Month (1-12) on which the fiscal year ends.
    #[serde(default = "default_fiscal_year_last_month")]
    pub fiscal_year_last_month: u32,
    /// Day of month on which the fiscal year ends.
    #[serde(default = "default_fiscal_year_last_day")]
    pub fiscal_year_last_day: u32,
    /// Maximum number of memoized exchange rate lookups per report.
    #[serde(default = "default_rate_cache_capacity")]
    pub rate_cache_capacity: u64,
}

fn default_company_currency() -> Currency {
    Currency::Usd
}

fn default_fiscal_year_last_month() -> u32 {
    12
}

fn default_fiscal_year_last_day() -> u32 {
    31
}

fn default_rate_cache_capacity() -> u64 {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            company_currency: default_company_currency(),
            fiscal_year_last_month: default_fiscal_year_last_month(),
            fiscal_year_last_day: default_fiscal_year_last_day(),
            rate_cache_capacity: default_rate_cache_capacity(),
        }
    }
}

impl EngineConfig {
    /// Checks that the fiscal year end is a real calendar day.
    ///
    /// February accepts day 29 so that leap-year fiscal calendars can be expressed;
    /// the engine clamps it to the last day of the month in non-leap years.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let max_day = match self.fiscal_year_last_month {
            2 => 29,
            4 | 6 | 9 | 11 => 30,
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            month => {
                return Err(config::ConfigError::Message(format!(
                    "engine.fiscal_year_last_month must be between 1 and 12, got {month}"
                )));
            }
        };
        if self.fiscal_year_last_day == 0 || self.fiscal_year_last_day > max_day {
            return Err(config::ConfigError::Message(format!(
                "engine.fiscal_year_last_day {} is not valid for month {}",
                self.fiscal_year_last_day, self.fiscal_year_last_month
            )));
        }
        if self.rate_cache_capacity == 0 {
            return Err(config::ConfigError::Message(
                "engine.rate_cache_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "deprecia=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default.toml`, `config/{RUN_MODE}.toml`, `DEPRECIA__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DEPRECIA").separator("__"))
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.engine.validate()?;
        Ok(app)
    }
}
