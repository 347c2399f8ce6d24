// Technical indicators over an ordered price series.
// Every function recomputes from the full slice it is given; nothing is carried between calls.

pub const NEUTRAL_RSI: f64 = 50.0;

// Arithmetic mean of the `window` prices ending at `index`, None while fewer are available
pub fn moving_average_at(prices: &[f64], window: usize, index: usize) -> Option<f64> {
    if window == 0 || index >= prices.len() || index + 1 < window {
        return None;
    }
    let slice = &prices[index + 1 - window..=index];
    Some(slice.iter().sum::<f64>() / window as f64)
}

pub fn moving_average(prices: &[f64], window: usize) -> Option<f64> {
    let index = prices.len().checked_sub(1)?;
    moving_average_at(prices, window, index)
}

// Moving average at every index, for chart overlays
pub fn moving_average_series(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..prices.len())
        .map(|index| moving_average_at(prices, window, index))
        .collect()
}

/// Relative Strength Index over the `period` price changes ending at `index`.
///
/// Gains and losses are simple averages over the trailing window. Returns None while fewer
/// than `period + 1` prices are available. When there are no losses the index is 100, and a
/// perfectly flat window (no gains either) is reported as the neutral 50 instead of NaN.
pub fn rsi_at(prices: &[f64], period: usize, index: usize) -> Option<f64> {
    if period == 0 || index >= prices.len() || index < period {
        return None;
    }

    let window = &prices[index - period..=index];
    let (gains, losses) = window
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gains, losses), delta| {
            if delta > 0.0 {
                (gains + delta, losses)
            } else {
                (gains, losses - delta)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Some(if avg_gain == 0.0 { NEUTRAL_RSI } else { 100.0 });
    }

    let rs = avg_gain / avg_loss;
    let rsi = 100.0 - 100.0 / (1.0 + rs);
    if rsi.is_finite() {
        Some(rsi.clamp(0.0, 100.0))
    } else {
        None
    }
}

pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    let index = prices.len().checked_sub(1)?;
    rsi_at(prices, period, index)
}

// Period-over-period change in percent; a zero previous price yields 0 rather than infinity
pub fn percent_change_at(prices: &[f64], index: usize) -> Option<f64> {
    if index == 0 || index >= prices.len() {
        return None;
    }
    let previous = prices[index - 1];
    if previous == 0.0 {
        return Some(0.0);
    }
    Some((prices[index] - previous) / previous * 100.0)
}

pub fn percent_change(prices: &[f64]) -> Option<f64> {
    let index = prices.len().checked_sub(1)?;
    percent_change_at(prices, index)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    // Absolute change from the first to the last retained price
    pub change: f64,
}

impl PriceStatistics {
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        let first = *prices.first()?;
        let last = *prices.last()?;

        let n = prices.len() as f64;
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = prices.iter().sum::<f64>() / n;

        // Sample standard deviation
        let std_dev = if prices.len() < 2 {
            0.0
        } else {
            let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        };

        Some(PriceStatistics {
            min,
            max,
            mean,
            std_dev,
            change: last - first,
        })
    }
}
