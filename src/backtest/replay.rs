use crate::models::{Candle, MarketUpdate, Signal};
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};

/// A BUY or SELL seen during a replay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalEvent {
    pub open_time: i64,
    pub close: f64,
    pub rsi: Option<f64>,
    pub signal: Signal,
}

/// Tally of evaluated updates
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SignalReport {
    pub evaluations: usize,
    pub rejected_candles: usize,
    pub buys: usize,
    pub sells: usize,
    pub holds: usize,
    pub no_signals: usize,
    pub last_rsi: Option<f64>,
    pub events: Vec<SignalEvent>,
}

impl SignalReport {
    /// Count one evaluated update
    pub fn record(&mut self, update: &MarketUpdate) {
        self.evaluations += 1;
        self.last_rsi = update.rsi;

        match update.signal {
            Signal::Buy => self.buys += 1,
            Signal::Sell => self.sells += 1,
            Signal::Hold => self.holds += 1,
            Signal::NoSignal => self.no_signals += 1,
        }

        if update.signal.is_actionable() {
            self.events.push(SignalEvent {
                open_time: update.timestamp,
                close: update.close,
                rsi: update.rsi,
                signal: update.signal,
            });
        }
    }

    /// Ends in a position: one more BUY than SELL
    pub fn ends_in_position(&self) -> bool {
        self.buys > self.sells
    }

    pub fn print_report(&self) {
        println!("\n📊 Signal Report");
        println!("   Evaluations:      {}", self.evaluations);
        println!("   Rejected candles: {}", self.rejected_candles);
        println!(
            "   BUY: {}  SELL: {}  HOLD: {}  NO_SIGNAL: {}",
            self.buys, self.sells, self.holds, self.no_signals
        );
        match self.last_rsi {
            Some(rsi) => println!("   Last RSI:         {:.2}", rsi),
            None => println!("   Last RSI:         not ready"),
        }

        for event in &self.events {
            let rsi = event.rsi.map_or_else(|| "-".to_string(), |r| format!("{:.2}", r));
            println!(
                "   {:<4} @ {:>14.8}  RSI {:>6}  (open time {})",
                event.signal, event.close, rsi, event.open_time
            );
        }
    }
}

/// Feed candles through a strategy one at a time, evaluating after each
///
/// Mirrors the live path (ingest, then evaluate) without channels or tasks.
pub fn replay<S: Strategy>(strategy: &mut S, candles: impl IntoIterator<Item = Candle>) -> SignalReport {
    let mut report = SignalReport::default();

    for candle in candles {
        if let Err(e) = strategy.add_candle(candle) {
            tracing::debug!(error = %e, "Replay skipped candle");
            report.rejected_candles += 1;
            continue;
        }

        if let Some(update) = strategy.evaluate() {
            report.record(&update);
        }
    }

    tracing::info!(
        strategy = strategy.name(),
        evaluations = report.evaluations,
        buys = report.buys,
        sells = report.sells,
        "Replay complete"
    );

    report
}
