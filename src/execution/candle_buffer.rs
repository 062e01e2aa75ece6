use crate::models::Candle;
use std::collections::VecDeque;

/// Default number of candles kept in the rolling window
pub const DEFAULT_CAPACITY: usize = 500;

/// Rolling window of closed candles for a single symbol
///
/// Appending past capacity evicts from the front (FIFO), so the buffer always
/// holds the most recent `capacity` candles in arrival order. Not
/// synchronized; share it through [`super::StrategyHandle`].
#[derive(Debug, Clone)]
pub struct CandleBuffer {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleBuffer {
    /// Create a new candle buffer
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of candles to keep (a zero capacity is
    ///   bumped to one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a candle, evicting the oldest while over capacity
    pub fn push(&mut self, candle: Candle) {
        self.candles.push_back(candle);

        while self.candles.len() > self.capacity {
            self.candles.pop_front();
        }
    }

    /// Closing prices, oldest first
    pub fn closing_prices(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close()).collect()
    }

    /// All candles, oldest first
    pub fn candles(&self) -> Vec<Candle> {
        self.candles.iter().copied().collect()
    }

    /// The `n` most recent candles, oldest first
    pub fn recent(&self, n: usize) -> Vec<Candle> {
        let skip = self.candles.len().saturating_sub(n);
        self.candles.iter().skip(skip).copied().collect()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every candle (history reload only)
    pub fn clear(&mut self) {
        self.candles.clear();
    }
}

impl Default for CandleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
