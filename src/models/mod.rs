use crate::error::{BotError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed OHLCV candle for the tracked symbol
///
/// Only built through [`Candle::new`], so every candle that reaches the
/// buffer has already passed validation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Candle {
    open_time: i64, // ms since epoch
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Candle {
    /// Validate raw OHLCV values and build a candle
    ///
    /// # Errors
    /// `InvalidCandle` when a price is non-finite or not positive, the volume
    /// is negative, or open/close fall outside the low..=high range.
    pub fn new(
        open_time: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self> {
        for (name, value) in [("open", open), ("high", high), ("low", low), ("close", close)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BotError::InvalidCandle(format!(
                    "{} must be a positive finite price, got {}",
                    name, value
                )));
            }
        }

        if !volume.is_finite() || volume < 0.0 {
            return Err(BotError::InvalidCandle(format!(
                "volume must be finite and non-negative, got {}",
                volume
            )));
        }

        if low > high {
            return Err(BotError::InvalidCandle(format!(
                "low {} is above high {}",
                low, high
            )));
        }

        if open < low || open > high || close < low || close > high {
            return Err(BotError::InvalidCandle(format!(
                "open {} / close {} outside range [{}, {}]",
                open, close, low, high
            )));
        }

        Ok(Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn open_time(&self) -> i64 {
        self.open_time
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Open time as a UTC timestamp, `None` if out of chrono's range
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.open_time).single()
    }
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
    NoSignal,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
            Signal::NoSignal => "NO_SIGNAL",
        }
    }

    /// BUY or SELL
    pub fn is_actionable(&self) -> bool {
        matches!(self, Signal::Buy | Signal::Sell)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record handed from the feed side to consumers after each evaluation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketUpdate {
    pub symbol: String,
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub rsi: Option<f64>,
    pub signal: Signal,
}

impl MarketUpdate {
    pub fn new(symbol: &str, candle: &Candle, rsi: Option<f64>, signal: Signal) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp: candle.open_time(),
            open: candle.open(),
            high: candle.high(),
            low: candle.low(),
            close: candle.close(),
            volume: candle.volume(),
            rsi,
            signal,
        }
    }
}
