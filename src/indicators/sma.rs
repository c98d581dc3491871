// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================

/// Arithmetic mean of the last `period` prices.
///
/// Degrades instead of failing:
/// - `prices.len() < period` => the last observed price.
/// - empty input => 0.0.
/// - `period == 0` => the last observed price.
pub fn sma(prices: &[f64], period: usize) -> f64 {
    let Some(&last) = prices.last() else {
        return 0.0;
    };
    if period == 0 || prices.len() < period {
        return last;
    }

    let window = &prices[prices.len() - period..];
    window.iter().sum::<f64>() / period as f64
}

/// Percentage gap of `short` above `long` (negative when below).
///
/// Returns 0.0 when `long` is zero.
pub fn gap_pct(short: f64, long: f64) -> f64 {
    if long == 0.0 {
        return 0.0;
    }
    (short - long) / long * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_full_window_is_mean() {
        let prices = vec![2.0, 4.0, 6.0, 8.0];
        assert!((sma(&prices, 4) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn sma_uses_only_the_tail() {
        let prices = vec![100.0, 1.0, 2.0, 3.0];
        assert!((sma(&prices, 3) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn sma_short_history_returns_last_price() {
        assert_eq!(sma(&[5.0, 7.0], 20), 7.0);
    }

    #[test]
    fn sma_empty_is_zero() {
        assert_eq!(sma(&[], 5), 0.0);
    }

    #[test]
    fn sma_constant_series_any_period() {
        let prices = vec![42.5; 30];
        for period in 1..=40 {
            assert!((sma(&prices, period) - 42.5).abs() < 1e-10, "period {period}");
        }
    }

    #[test]
    fn gap_pct_signs() {
        assert!((gap_pct(102.0, 100.0) - 2.0).abs() < 1e-10);
        assert!((gap_pct(97.0, 100.0) + 3.0).abs() < 1e-10);
        assert_eq!(gap_pct(1.0, 0.0), 0.0);
    }
}
