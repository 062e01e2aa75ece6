use crate::error::{BotError, Result};
use crate::models::Candle;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MarketScenario {
    /// Sell-off, consolidation, then a rally (one full BUY/SELL cycle)
    OversoldRecovery,
    /// Steady uptrend with noise
    Uptrend,
    /// Steady downtrend with noise
    Downtrend,
    /// Sideways/choppy market (±1% around mean)
    Sideways,
    /// High volatility (±5% large swings)
    Volatile,
}

/// Generates synthetic candles for replaying through the strategy
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 100.0,
            base_volume: 1_000_000.0,
        }
    }

    pub fn with_base_price(mut self, base_price: f64) -> Self {
        self.base_price = base_price;
        self
    }

    /// Generate closed candles ending at the current interval boundary
    ///
    /// # Arguments
    /// * `scenario` - The market scenario to simulate
    /// * `num_candles` - Number of candles to generate
    /// * `interval_ms` - Milliseconds between candle open times
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_candles: usize,
        interval_ms: i64,
    ) -> Result<Vec<Candle>> {
        let interval_ms = interval_ms.max(1);
        let now = Utc::now().timestamp_millis();
        let start_time = i64::try_from(num_candles)
            .ok()
            .and_then(|n| n.checked_mul(interval_ms))
            .and_then(|span| (now - now % interval_ms).checked_sub(span))
            .ok_or_else(|| {
                BotError::InvalidConfiguration(format!(
                    "{} candles of {}ms do not fit before now",
                    num_candles, interval_ms
                ))
            })?;

        let closes = self.closes(scenario, num_candles);

        let mut candles = Vec::with_capacity(num_candles);
        for (i, close) in closes.into_iter().enumerate() {
            let open_time = start_time + i as i64 * interval_ms;
            candles.push(self.create_candle(open_time, close)?);
        }

        Ok(candles)
    }

    fn closes(&mut self, scenario: MarketScenario, num_candles: usize) -> Vec<f64> {
        let mut closes = Vec::with_capacity(num_candles);
        let mut price = self.base_price;
        let mean_price = self.base_price;
        let third = (num_candles / 3).max(1);

        for i in 0..num_candles {
            let change_pct = match scenario {
                MarketScenario::OversoldRecovery => {
                    let drift = if i < third {
                        -0.015
                    } else if i < 2 * third {
                        0.0
                    } else {
                        0.015
                    };
                    let noise = if drift == 0.0 { 0.01 } else { 0.002 };
                    drift + self.rng.gen_range(-noise..noise)
                }
                MarketScenario::Uptrend => 0.002 + self.rng.gen_range(-0.001..0.001),
                MarketScenario::Downtrend => -0.002 + self.rng.gen_range(-0.001..0.001),
                MarketScenario::Sideways => {
                    // 10% pull back to the mean plus ±1% noise
                    (mean_price - price) / price * 0.1 + self.rng.gen_range(-0.01..0.01)
                }
                MarketScenario::Volatile => self.rng.gen_range(-0.05..0.05),
            };

            price *= 1.0 + change_pct;

            // Prevent price from going too low
            price = price.max(self.base_price * 0.01);
            closes.push(price);
        }

        closes
    }

    /// Helper to create a candle around a close price
    fn create_candle(&mut self, open_time: i64, close: f64) -> Result<Candle> {
        let noise_pct = 0.002; // ±0.2% intrabar movement

        let high = close * (1.0 + self.rng.gen_range(0.0..noise_pct));
        let low = close * (1.0 - self.rng.gen_range(0.0..noise_pct));

        // Generate open and clamp it between low and high
        let open = (close * (1.0 + self.rng.gen_range(-noise_pct..noise_pct))).clamp(low, high);

        // Vary volume ±30%
        let volume = self.base_volume * self.rng.gen_range(0.7..1.3);

        Candle::new(open_time, open, high, low, close, volume)
    }
}

/// Milliseconds per candle for a kline interval such as `1m`, `15m`, `4h`
pub fn interval_ms(timeframe: &str) -> Option<i64> {
    let timeframe = timeframe.trim();
    let split = timeframe.len().checked_sub(1)?;
    if !timeframe.is_char_boundary(split) {
        return None;
    }
    let (count, unit) = timeframe.split_at(split);
    let count: i64 = count.parse().ok().filter(|c| *c > 0)?;

    let unit_ms = match unit {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 604_800_000,
        _ => return None,
    };

    count.checked_mul(unit_ms)
}

/// Render a candle as a closed Binance kline stream event
pub fn to_kline_message(symbol: &str, timeframe: &str, interval_ms: i64, candle: &Candle) -> String {
    let close_time = candle.open_time() + interval_ms - 1;
    serde_json::json!({
        "e": "kline",
        "E": close_time + 1,
        "s": symbol,
        "k": {
            "t": candle.open_time(),
            "T": close_time,
            "s": symbol,
            "i": timeframe,
            "o": candle.open().to_string(),
            "h": candle.high().to_string(),
            "l": candle.low().to_string(),
            "c": candle.close().to_string(),
            "v": candle.volume().to_string(),
            "x": true
        }
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::parse_kline_message;

    const FIVE_MIN_MS: i64 = 300_000;

    #[test]
    fn test_generate_uptrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Uptrend, 500, FIVE_MIN_MS).unwrap();

        assert_eq!(candles.len(), 500);

        let first_price = candles.first().unwrap().close();
        let last_price = candles.last().unwrap().close();

        assert!(
            last_price > first_price,
            "Uptrend should end higher: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_downtrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Downtrend, 500, FIVE_MIN_MS).unwrap();

        let first_price = candles.first().unwrap().close();
        let last_price = candles.last().unwrap().close();

        assert!(
            last_price < first_price,
            "Downtrend should end lower: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_sideways() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Sideways, 500, FIVE_MIN_MS).unwrap();

        // Should stay roughly around base price (±10%)
        let base = gen.base_price;
        for candle in &candles {
            assert!(
                candle.close() > base * 0.9 && candle.close() < base * 1.1,
                "Sideways should stay near base: {} vs {}",
                candle.close(),
                base
            );
        }
    }

    #[test]
    fn test_oversold_recovery_shape() {
        let mut gen = SyntheticDataGenerator::new(7);
        let candles = gen
            .generate(MarketScenario::OversoldRecovery, 90, FIVE_MIN_MS)
            .unwrap();

        let closes: Vec<f64> = candles.iter().map(|c| c.close()).collect();
        assert!(closes[..30].windows(2).all(|w| w[1] < w[0]));
        assert!(closes[60..].windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_timestamps_are_sequential() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Volatile, 100, FIVE_MIN_MS).unwrap();

        for pair in candles.windows(2) {
            assert_eq!(pair[1].open_time() - pair[0].open_time(), FIVE_MIN_MS);
        }
        assert_eq!(candles[0].open_time() % FIVE_MIN_MS, 0);
    }

    #[test]
    fn test_ohlc_consistency() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Volatile, 100, FIVE_MIN_MS).unwrap();

        for candle in &candles {
            assert!(candle.high() >= candle.close(), "High should be >= close");
            assert!(candle.high() >= candle.open(), "High should be >= open");
            assert!(candle.low() <= candle.close(), "Low should be <= close");
            assert!(candle.low() <= candle.open(), "Low should be <= open");
        }
    }

    #[test]
    fn test_interval_parsing() {
        assert_eq!(interval_ms("1m"), Some(60_000));
        assert_eq!(interval_ms("15m"), Some(900_000));
        assert_eq!(interval_ms("4h"), Some(14_400_000));
        assert_eq!(interval_ms("1d"), Some(86_400_000));
        assert_eq!(interval_ms("0m"), None);
        assert_eq!(interval_ms("m"), None);
        assert_eq!(interval_ms(""), None);
        assert_eq!(interval_ms("3x"), None);
        assert_eq!(interval_ms("999999999999999w"), None);
    }

    #[test]
    fn test_generate_rejects_span_overflow() {
        let mut gen = SyntheticDataGenerator::new(42);
        let result = gen.generate(MarketScenario::Uptrend, 10, i64::MAX / 4);
        assert!(matches!(result, Err(BotError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_kline_message_round_trips_through_parser() {
        let mut gen = SyntheticDataGenerator::new(1);
        let candle = gen.generate(MarketScenario::Uptrend, 1, 60_000).unwrap()[0];

        let text = to_kline_message("PEPEUSDT", "1m", 60_000, &candle);
        let kline = parse_kline_message(&text).unwrap().unwrap();

        assert!(kline.is_closed);
        assert_eq!(kline.close_time, candle.open_time() + 59_999);
        assert_eq!(kline.to_candle().unwrap(), candle);
    }
}
