/// Calculate Relative Strength Index (RSI) using Wilder's smoothing
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// Returns `None` when fewer than `period + 1` prices are available: the
/// indicator is not ready yet, which is not the same as an RSI of zero.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    RsiSeries::new(prices, period).last().flatten()
}

/// RSI for every price, aligned one-to-one with `prices`
///
/// The first element is always `None` (no delta yet), followed by `None`
/// until the averages are seeded. Used for charting the oscillator next to
/// the candles it was computed from.
pub fn calculate_rsi_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    if prices.is_empty() {
        return Vec::new();
    }

    std::iter::once(None)
        .chain(RsiSeries::new(prices, period))
        .collect()
}

/// Lazy RSI sequence over a price slice
///
/// Yields one item per price delta (so `prices.len() - 1` items). Items are
/// `None` while the first `period` deltas are collected for the seed
/// averages, then `Some(rsi)` from the delta that completes the seed onward.
/// Cloning or calling [`RsiSeries::restart`] replays from the first delta.
#[derive(Debug, Clone)]
pub struct RsiSeries<'a> {
    prices: &'a [f64],
    period: usize,
    next_index: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl<'a> RsiSeries<'a> {
    pub fn new(prices: &'a [f64], period: usize) -> Self {
        Self {
            prices,
            period,
            next_index: 1,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    /// Rewind to the first delta
    pub fn restart(&mut self) {
        self.next_index = 1;
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
    }
}

impl Iterator for RsiSeries<'_> {
    type Item = Option<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.prices.len() {
            return None;
        }

        let i = self.next_index;
        self.next_index += 1;

        if self.period == 0 {
            return Some(None);
        }

        let change = self.prices[i] - self.prices[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let period = self.period as f64;

        // `i` deltas consumed so far
        if i < self.period {
            // Still collecting the seed, averages hold running sums
            self.avg_gain += gain;
            self.avg_loss += loss;
            return Some(None);
        }

        if i == self.period {
            self.avg_gain = (self.avg_gain + gain) / period;
            self.avg_loss = (self.avg_loss + loss) / period;
        } else {
            self.avg_gain = (self.avg_gain * (period - 1.0) + gain) / period;
            self.avg_loss = (self.avg_loss * (period - 1.0) + loss) / period;
        }

        Some(Some(rsi_from_averages(self.avg_gain, self.avg_loss)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.prices.len().saturating_sub(self.next_index);
        (remaining, Some(remaining))
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
