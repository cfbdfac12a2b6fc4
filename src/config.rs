use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub bind_address: String,
    /// Send connection handed to every settlement
    pub rpc_url: String,
    pub settlement_relay_url: String,
    /// Durable preference file (auto-settle toggle)
    pub preferences_path: String,
    pub tick_interval_ms: u64,
    /// Minimum gap between automatic settlement triggers
    pub cooldown_ms: u64,
    /// Process-wide kill switch for automatic settlement, fixed at startup
    pub auto_settle_disabled_override: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    pub fn from_environment(env: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("rpc_url", "https://api.mainnet-beta.solana.com")?
            .set_default("settlement_relay_url", "http://localhost:8899/settle")?
            .set_default("preferences_path", "./settle-panel.prefs.json")?
            .set_default("tick_interval_ms", 1000_i64)?
            .set_default("cooldown_ms", 15000_i64)?
            .set_default("auto_settle_disabled_override", false)?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(AppError::Config("TICK_INTERVAL_MS must be greater than zero".into()));
        }
        if self.settlement_relay_url.trim().is_empty() {
            return Err(AppError::Config("SETTLEMENT_RELAY_URL must be set".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
