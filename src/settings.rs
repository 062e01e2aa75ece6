use crate::backtest::interval_ms;
use crate::error::{BotError, Result};
use crate::execution::DEFAULT_CAPACITY;
use crate::strategy::{RsiStrategy, SignalConfig};
use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `RSIBOT_RSI_PERIOD=21`
pub const ENV_PREFIX: &str = "RSIBOT";

/// Runtime settings
///
/// Layered lowest to highest: built-in defaults, optional settings file
/// (TOML/JSON, picked by extension), then `RSIBOT_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub symbol: String,
    pub timeframe: String,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub buffer_capacity: usize,
    pub log_filter: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        let signal = SignalConfig::default();
        Self {
            symbol: "PEPEUSDT".to_string(),
            timeframe: "1m".to_string(),
            rsi_period: signal.rsi_period,
            rsi_oversold: signal.rsi_oversold,
            rsi_overbought: signal.rsi_overbought,
            buffer_capacity: DEFAULT_CAPACITY,
            log_filter: "rsibot=info".to_string(),
        }
    }
}

impl BotConfig {
    /// Load settings from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        Self::finish(builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true)))
    }

    /// Parse settings from TOML text layered over the defaults
    pub fn from_toml(text: &str) -> Result<Self> {
        Self::finish(Self::defaults()?.add_source(File::from_str(text, FileFormat::Toml)))
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder().add_source(Config::try_from(&Self::default())?))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn signal_config(&self) -> SignalConfig {
        SignalConfig {
            rsi_period: self.rsi_period,
            rsi_oversold: self.rsi_oversold,
            rsi_overbought: self.rsi_overbought,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(BotError::InvalidConfiguration(
                "symbol must not be empty".to_string(),
            ));
        }

        if interval_ms(&self.timeframe).is_none() {
            return Err(BotError::InvalidConfiguration(format!(
                "unsupported timeframe {:?}",
                self.timeframe
            )));
        }

        let signal = self.signal_config();
        signal.validate()?;

        if self.buffer_capacity < signal.min_closes() {
            return Err(BotError::InvalidConfiguration(format!(
                "buffer_capacity must be at least {}, got {}",
                signal.min_closes(),
                self.buffer_capacity
            )));
        }

        Ok(())
    }

    /// Build a flat strategy from these settings
    pub fn build_strategy(&self) -> Result<RsiStrategy> {
        RsiStrategy::new(
            self.symbol.clone(),
            self.timeframe.clone(),
            self.signal_config(),
            self.buffer_capacity,
        )
    }
}
