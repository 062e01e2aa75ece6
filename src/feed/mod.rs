// Inbound market-data boundary: kline decoding, candle validation and the
// feed task lifecycle. Sockets and HTTP clients live outside the crate.
pub mod adapter;
pub mod kline;
pub mod runner;

pub use adapter::{FeedAdapter, MessageOutcome};
pub use kline::{parse_kline_message, Kline};
pub use runner::{FeedRunner, FeedStats};
