use super::{
    signals::{PositionState, SignalConfig, SignalStateMachine},
    Strategy,
};
use crate::error::{BotError, Result};
use crate::execution::CandleBuffer;
use crate::indicators::{calculate_rsi, calculate_rsi_series};
use crate::models::{Candle, MarketUpdate, Signal};

/// RSI mean-reversion strategy for a single symbol
///
/// Owns the rolling candle window and the position flag. Ingestion
/// ([`RsiStrategy::add_candle`]) and evaluation ([`RsiStrategy::get_signal`])
/// are separate steps: adding a candle never fires a signal on its own.
///
/// Evaluation is a state transition, not a pure read. Calling `get_signal`
/// twice on the same data can return BUY then HOLD, because the first call
/// already moved the strategy into a position.
#[derive(Debug, Clone)]
pub struct RsiStrategy {
    symbol: String,
    timeframe: String,
    config: SignalConfig,
    buffer: CandleBuffer,
    machine: SignalStateMachine,
}

impl RsiStrategy {
    /// Create a flat strategy
    ///
    /// # Errors
    /// `InvalidConfiguration` for an empty symbol, invalid thresholds, or a
    /// buffer too small to ever hold `rsi_period + 1` closes.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
        config: SignalConfig,
        buffer_capacity: usize,
    ) -> Result<Self> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(BotError::InvalidConfiguration(
                "symbol must not be empty".to_string(),
            ));
        }

        let machine = SignalStateMachine::new(&config)?;

        if buffer_capacity < config.min_closes() {
            return Err(BotError::InvalidConfiguration(format!(
                "buffer_capacity {} cannot hold the {} closes RSI({}) needs",
                buffer_capacity,
                config.min_closes(),
                config.rsi_period
            )));
        }

        Ok(Self {
            symbol,
            timeframe: timeframe.into(),
            config,
            buffer: CandleBuffer::new(buffer_capacity),
            machine,
        })
    }

    pub fn timeframe(&self) -> &str {
        &self.timeframe
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn position_state(&self) -> PositionState {
        self.machine.state()
    }

    pub fn in_position(&self) -> bool {
        self.machine.in_position()
    }

    /// Number of candles currently buffered
    pub fn candle_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn last_candle(&self) -> Option<Candle> {
        self.buffer.last().copied()
    }

    /// Snapshot of the buffered candles, oldest first
    pub fn candles(&self) -> Vec<Candle> {
        self.buffer.candles()
    }

    /// RSI over the current window, `None` until enough closes arrived
    pub fn current_rsi(&self) -> Option<f64> {
        calculate_rsi(&self.buffer.closing_prices(), self.config.rsi_period)
    }

    /// RSI aligned with [`RsiStrategy::candles`], for charting
    pub fn rsi_series(&self) -> Vec<Option<f64>> {
        calculate_rsi_series(&self.buffer.closing_prices(), self.config.rsi_period)
    }

    /// Replace the window with historical candles
    ///
    /// Candles are sorted by open time, duplicates keep the later entry, and
    /// only the newest `capacity` survive. No signal is evaluated and the
    /// position flag is left alone. Returns the RSI series aligned with the
    /// loaded window.
    pub fn load_history(&mut self, mut candles: Vec<Candle>) -> Vec<Option<f64>> {
        candles.sort_by_key(|c| c.open_time());

        let mut deduped: Vec<Candle> = Vec::with_capacity(candles.len());
        for candle in candles {
            match deduped.last_mut() {
                Some(last) if last.open_time() == candle.open_time() => *last = candle,
                _ => deduped.push(candle),
            }
        }

        self.buffer.clear();
        for candle in deduped {
            self.buffer.push(candle);
        }

        tracing::info!(
            symbol = %self.symbol,
            timeframe = %self.timeframe,
            candles = self.buffer.len(),
            "Loaded historical candles"
        );

        self.rsi_series()
    }

    fn apply(&mut self, rsi: Option<f64>) -> Signal {
        let signal = self.machine.evaluate(rsi);

        match signal {
            Signal::Buy => tracing::info!(
                symbol = %self.symbol,
                rsi = rsi.unwrap_or_default(),
                oversold = self.config.rsi_oversold,
                "BUY signal: RSI below oversold threshold"
            ),
            Signal::Sell => tracing::info!(
                symbol = %self.symbol,
                rsi = rsi.unwrap_or_default(),
                overbought = self.config.rsi_overbought,
                "SELL signal: RSI above overbought threshold"
            ),
            Signal::Hold => tracing::debug!(
                symbol = %self.symbol,
                rsi = rsi.unwrap_or_default(),
                in_position = self.machine.in_position(),
                "HOLD"
            ),
            Signal::NoSignal => tracing::debug!(
                symbol = %self.symbol,
                candles = self.buffer.len(),
                needed = self.config.min_closes(),
                "RSI not ready"
            ),
        }

        signal
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        "RsiStrategy"
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn min_candles_required(&self) -> usize {
        self.config.min_closes()
    }

    /// Append a closed candle
    ///
    /// Candles whose open time is not after the last stored one are rejected
    /// and logged; the window stays strictly ordered.
    fn add_candle(&mut self, candle: Candle) -> Result<()> {
        if let Some(last) = self.buffer.last() {
            if candle.open_time() <= last.open_time() {
                tracing::warn!(
                    symbol = %self.symbol,
                    last = last.open_time(),
                    received = candle.open_time(),
                    "Rejected out-of-order candle"
                );
                return Err(BotError::OutOfOrderCandle {
                    last: last.open_time(),
                    received: candle.open_time(),
                });
            }
        }

        self.buffer.push(candle);
        Ok(())
    }

    fn get_signal(&mut self) -> Signal {
        let rsi = self.current_rsi();
        self.apply(rsi)
    }

    fn evaluate(&mut self) -> Option<MarketUpdate> {
        let rsi = self.current_rsi();
        let signal = self.apply(rsi);
        let last = self.buffer.last()?;

        Some(MarketUpdate::new(&self.symbol, last, rsi, signal))
    }
}
