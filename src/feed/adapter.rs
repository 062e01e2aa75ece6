use super::kline::parse_kline_message;
use crate::error::Result;
use crate::execution::{StrategyHandle, UpdateSender};
use crate::models::{Candle, MarketUpdate};
use crate::strategy::{RsiStrategy, Strategy};

/// What happened to one raw feed message
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    /// Not a kline event
    Ignored,
    /// Kline for a candle that is still forming
    InProgress,
    /// Kline for a different symbol than the strategy's
    WrongSymbol(String),
    /// Closed candle ingested; carries the evaluation when one ran
    Ingested(Option<MarketUpdate>),
}

/// Inbound boundary between a market-data feed and the strategy
///
/// Raw values are validated into a [`Candle`] here and nowhere else.
pub struct FeedAdapter<S = RsiStrategy> {
    handle: StrategyHandle<S>,
    updates: UpdateSender,
}

impl<S> Clone for FeedAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            updates: self.updates.clone(),
        }
    }
}

impl<S: Strategy> FeedAdapter<S> {
    pub fn new(handle: StrategyHandle<S>, updates: UpdateSender) -> Self {
        Self { handle, updates }
    }

    pub fn handle(&self) -> &StrategyHandle<S> {
        &self.handle
    }

    /// Closed candle callback
    ///
    /// Validates, ingests and evaluates under one lock, publishing the
    /// resulting update on the hand-off queue. Every accepted candle is
    /// evaluated before the next one can be ingested.
    pub fn on_closed_candle(
        &self,
        open_time_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Option<MarketUpdate>> {
        let candle = Candle::new(open_time_ms, open, high, low, close, volume)?;
        self.ingest(candle)
    }

    /// Decode and route one raw kline stream message
    pub fn handle_message(&self, text: &str) -> Result<MessageOutcome> {
        let Some(kline) = parse_kline_message(text)? else {
            return Ok(MessageOutcome::Ignored);
        };

        if !kline.is_closed {
            tracing::trace!(open_time = kline.open_time, "Skipping in-progress candle");
            return Ok(MessageOutcome::InProgress);
        }

        let symbol = self.handle.symbol();
        if !kline.symbol.eq_ignore_ascii_case(&symbol) {
            tracing::warn!(
                expected = %symbol,
                received = %kline.symbol,
                "Kline for unexpected symbol"
            );
            return Ok(MessageOutcome::WrongSymbol(kline.symbol));
        }

        tracing::debug!(
            symbol = %kline.symbol,
            close = %kline.close,
            "Closed candle received"
        );

        let candle = kline.to_candle()?;
        Ok(MessageOutcome::Ingested(self.ingest(candle)?))
    }

    fn ingest(&self, candle: Candle) -> Result<Option<MarketUpdate>> {
        let update = self.handle.add_and_evaluate(candle)?;
        if let Some(update) = &update {
            self.updates.publish(update.clone());
        }
        Ok(update)
    }
}
