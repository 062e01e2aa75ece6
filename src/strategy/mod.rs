// Trading strategy module
pub mod rsi_strategy;
pub mod signals;

use crate::error::Result;
use crate::models::{Candle, MarketUpdate, Signal};

pub use rsi_strategy::RsiStrategy;
pub use signals::{PositionState, SignalConfig, SignalStateMachine};

/// Base trait for stateful single-symbol strategies
pub trait Strategy: Send {
    /// Get strategy name
    fn name(&self) -> &str;

    /// Symbol the strategy trades
    fn symbol(&self) -> &str;

    /// Minimum candles required before a signal can be produced
    fn min_candles_required(&self) -> usize;

    /// Ingest one closed candle without evaluating
    fn add_candle(&mut self, candle: Candle) -> Result<()>;

    /// Evaluate the current window and apply the resulting transition
    fn get_signal(&mut self) -> Signal;

    /// Like [`Strategy::get_signal`], packaged with the latest candle.
    /// `None` while no candle has been ingested.
    fn evaluate(&mut self) -> Option<MarketUpdate>;
}
