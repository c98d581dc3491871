// =============================================================================
// Exponential Moving Average (EMA) and simplified MACD
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = (close_t - EMA_{t-1}) * multiplier + EMA_{t-1}
//
// The seed is the SMA of the *last* `period` closes. Smoothing then walks the
// closes after the first element of that window up to the newest close, so
// the result only ever looks at the trailing `period` prices.
// =============================================================================

use super::sma::sma;

/// Fast EMA period used by MACD.
pub const MACD_FAST: usize = 12;
/// Slow EMA period used by MACD.
pub const MACD_SLOW: usize = 26;

/// EMA seed followed by every smoothing step, oldest first.
///
/// The first element is always the SMA of the last `period` prices. Returns
/// an empty `Vec` when `period == 0` or there are fewer than `period` prices.
pub fn ema_series(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema = sma(prices, period);

    let mut out = Vec::with_capacity(period);
    out.push(ema);
    for &price in &prices[prices.len() - period + 1..] {
        ema = (price - ema) * multiplier + ema;
        out.push(ema);
    }
    out
}

/// Current EMA value over the trailing window.
///
/// Degrades to the last observed price (0.0 when empty) when there are fewer
/// than `period` prices.
pub fn ema(prices: &[f64], period: usize) -> f64 {
    match ema_series(prices, period).last() {
        Some(&v) => v,
        None => prices.last().copied().unwrap_or(0.0),
    }
}

/// MACD "histogram": `EMA(12) - EMA(26)`.
///
/// Simplification: the MACD line itself is reported as the histogram. There
/// is no signal-line EMA, so a positive value means "fast above slow", not a
/// signal-line cross.
pub fn macd_histogram(prices: &[f64]) -> f64 {
    ema(prices, MACD_FAST) - ema(prices, MACD_SLOW)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn ascending(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn ema_series_empty_on_short_input() {
        assert!(ema_series(&[1.0, 2.0], 5).is_empty());
        assert!(ema_series(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn ema_seed_matches_sma() {
        let prices = vec![3.0, 9.0, 1.0, 4.0, 7.0, 2.0, 8.0];
        for period in 1..=prices.len() {
            let series = ema_series(&prices, period);
            assert!((series[0] - sma(&prices, period)).abs() < 1e-12, "period {period}");
        }
    }

    #[test]
    fn ema_series_has_one_value_per_window_slot() {
        let series = ema_series(&ascending(40), 12);
        assert_eq!(series.len(), 12);
    }

    #[test]
    fn ema_known_values() {
        // period 5 over 1..=10: seed = mean(6..=10) = 8, then walk 7, 8, 9, 10
        let closes = ascending(10);
        let mult = 2.0 / 6.0;
        let mut expected = 8.0;
        for c in [7.0, 8.0, 9.0, 10.0] {
            expected = (c - expected) * mult + expected;
        }
        assert!((ema(&closes, 5) - expected).abs() < 1e-10);
    }

    #[test]
    fn ema_short_history_returns_last_price() {
        assert_eq!(ema(&[4.0, 5.0, 6.0], 12), 6.0);
        assert_eq!(ema(&[], 12), 0.0);
    }

    #[test]
    fn ema_constant_series_is_constant() {
        assert!((ema(&[250.0; 40], 26) - 250.0).abs() < 1e-10);
    }

    #[test]
    fn macd_positive_on_rising_series() {
        assert!(macd_histogram(&ascending(60)) > 0.0);
    }

    #[test]
    fn macd_negative_on_falling_series() {
        let closes: Vec<f64> = (1..=60).rev().map(|x| x as f64).collect();
        assert!(macd_histogram(&closes) < 0.0);
    }

    #[test]
    fn macd_zero_on_flat_series() {
        assert_eq!(macd_histogram(&[100.0; 40]), 0.0);
    }

    #[test]
    fn macd_with_short_history_compares_last_prices() {
        // Both EMAs degrade to the last price => zero.
        assert_eq!(macd_histogram(&[1.0, 2.0, 3.0]), 0.0);
    }
}
