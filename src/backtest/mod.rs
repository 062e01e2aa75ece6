// Offline replay of synthetic or recorded candles
pub mod replay;
pub mod synthetic;

pub use replay::{replay, SignalEvent, SignalReport};
pub use synthetic::{interval_ms, to_kline_message, MarketScenario, SyntheticDataGenerator};
