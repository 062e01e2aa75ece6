use crate::error::{BotError, Result};
use crate::models::Candle;
use serde::Deserialize;

// ─── Binance kline JSON parsing ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct KlineEvent {
    k: Kline,
}

/// Kline payload (`k` object) of a Binance kline stream event
///
/// Prices arrive as decimal strings and are only converted once, in
/// [`Kline::to_candle`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Kline {
    #[serde(rename = "t")]
    pub open_time: i64,
    #[serde(rename = "T", default)]
    pub close_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "i", default)]
    pub interval: String,
    #[serde(rename = "o")]
    pub open: String,
    #[serde(rename = "h")]
    pub high: String,
    #[serde(rename = "l")]
    pub low: String,
    #[serde(rename = "c")]
    pub close: String,
    #[serde(rename = "v")]
    pub volume: String,
    #[serde(rename = "x")]
    pub is_closed: bool,
}

impl Kline {
    /// Convert to a validated candle
    pub fn to_candle(&self) -> Result<Candle> {
        Candle::new(
            self.open_time,
            parse_decimal("o", &self.open)?,
            parse_decimal("h", &self.high)?,
            parse_decimal("l", &self.low)?,
            parse_decimal("c", &self.close)?,
            parse_decimal("v", &self.volume)?,
        )
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|e| {
        BotError::MalformedMessage(format!("field {} = {:?}: {}", field, raw, e))
    })
}

/// Decode a raw stream message
///
/// Returns `Ok(None)` for events other than `kline` (subscription acks,
/// trades, ...); those are not errors.
pub fn parse_kline_message(text: &str) -> Result<Option<Kline>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.get("e").and_then(|v| v.as_str()) != Some("kline") {
        return Ok(None);
    }

    let event: KlineEvent = serde_json::from_value(value)?;
    Ok(Some(event.k))
}
