// Technical indicators module
// Wilder's RSI over closing prices

pub mod rsi;

pub use rsi::{calculate_rsi, calculate_rsi_series, RsiSeries};
