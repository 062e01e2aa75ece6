// Core modules
pub mod backtest;
pub mod error;
pub mod execution;
pub mod feed;
pub mod indicators;
pub mod models;
pub mod settings;
pub mod strategy;

// Re-export commonly used types
pub use error::{BotError, Result};
pub use execution::{update_queue, StrategyHandle, UpdateReceiver, UpdateSender};
pub use feed::{FeedAdapter, FeedRunner};
pub use models::*;
pub use settings::BotConfig;
pub use strategy::{RsiStrategy, Strategy};
