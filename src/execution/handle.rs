use crate::error::Result;
use crate::models::{Candle, MarketUpdate, Signal};
use crate::strategy::{RsiStrategy, Strategy};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared, serialized access to a strategy
///
/// The feed task ingests through one clone while consumers read through
/// another. Every operation takes the same lock, so ingestion and
/// evaluation never interleave and the buffer is never handed out mutably.
#[derive(Debug)]
pub struct StrategyHandle<S = RsiStrategy> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for StrategyHandle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Strategy> StrategyHandle<S> {
    pub fn new(strategy: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(strategy)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        // Strategy operations never leave state half-written, so a poisoned
        // lock still guards a consistent strategy.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_candle(&self, candle: Candle) -> Result<()> {
        self.lock().add_candle(candle)
    }

    pub fn get_signal(&self) -> Signal {
        self.lock().get_signal()
    }

    pub fn evaluate(&self) -> Option<MarketUpdate> {
        self.lock().evaluate()
    }

    /// Ingest then evaluate under a single lock acquisition
    pub fn add_and_evaluate(&self, candle: Candle) -> Result<Option<MarketUpdate>> {
        let mut strategy = self.lock();
        strategy.add_candle(candle)?;
        Ok(strategy.evaluate())
    }

    pub fn symbol(&self) -> String {
        self.lock().symbol().to_string()
    }

    /// Run a read or maintenance closure against the strategy under the lock
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut *self.lock())
    }
}
