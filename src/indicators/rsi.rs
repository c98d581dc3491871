// =============================================================================
// Relative Strength Index (RSI): simple-average variant
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1: Take the last `period` transitions (each close vs its predecessor).
// Step 2: Sum positive deltas as gains, negated negative deltas as losses.
// Step 3: avg_gain = gains / period, avg_loss = losses / period
//          (plain averages, no Wilder smoothing).
// Step 4: RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Thresholds:  RSI > 70 => OVERBOUGHT,  RSI < 30 => OVERSOLD.
// =============================================================================

/// Neutral value returned while there are fewer than `period + 1` prices.
pub const RSI_NEUTRAL: f64 = 50.0;

/// Compute the RSI of the most recent `period` transitions in `prices`.
///
/// # Edge cases
/// - `prices.len() < period + 1` => [`RSI_NEUTRAL`] (insufficient data).
/// - Average loss of zero => 100.0. This includes a perfectly flat window,
///   where gains and losses are both zero.
/// - `period == 0` is treated like insufficient data.
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return RSI_NEUTRAL;
    }

    let start = prices.len() - period;
    let (gains, losses) = (start..prices.len()).fold((0.0_f64, 0.0_f64), |(g, l), i| {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            (g + change, l)
        } else {
            (g, l - change)
        }
    });

    let period_f = period as f64;
    let avg_gain = gains / period_f;
    let avg_loss = losses / period_f;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Human-readable zone for an RSI reading.
pub fn rsi_zone(value: f64) -> &'static str {
    if value < 30.0 {
        "OVERSOLD"
    } else if value > 70.0 {
        "OVERBOUGHT"
    } else {
        "NEUTRAL"
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_empty_input_is_neutral() {
        assert_eq!(rsi(&[], 14), RSI_NEUTRAL);
    }

    #[test]
    fn rsi_short_history_is_exactly_neutral() {
        for len in 0..=14 {
            let prices: Vec<f64> = (0..len).map(|i| 100.0 + (i as f64 * 7.3).sin()).collect();
            assert_eq!(rsi(&prices, 14), 50.0, "len {len}");
        }
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let prices: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        assert!((rsi(&prices, 14) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_non_negative_deltas_is_100() {
        let prices = vec![
            10.0, 10.0, 11.0, 11.0, 11.0, 12.0, 12.0, 12.0, 12.0, 13.0, 13.0, 13.0, 14.0,
            14.0, 14.0,
        ];
        assert_eq!(rsi(&prices, 14), 100.0);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let prices: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        assert!(rsi(&prices, 14).abs() < 1e-10);
    }

    #[test]
    fn rsi_flat_window_takes_zero_loss_branch() {
        // 15 identical prices => 14 zero deltas => avg_loss == 0 => 100.
        assert_eq!(rsi(&[100.0; 15], 14), 100.0);
        // 14 identical prices are still one short of a full window.
        assert_eq!(rsi(&[100.0; 14], 14), 50.0);
    }

    #[test]
    fn rsi_only_uses_last_period_transitions() {
        // A crash early in the series must not leak into the window.
        let mut prices = vec![1000.0, 10.0];
        prices.extend((0..14).map(|i| 10.0 + i as f64));
        assert_eq!(rsi(&prices, 14), 100.0);
    }

    #[test]
    fn rsi_known_mixed_window() {
        // period 4: deltas +2, -1, +3, -2 => gains 5, losses 3
        let prices = vec![10.0, 12.0, 11.0, 14.0, 12.0];
        let expected = 100.0 - 100.0 / (1.0 + (5.0 / 4.0) / (3.0 / 4.0));
        assert!((rsi(&prices, 4) - expected).abs() < 1e-10);
    }

    #[test]
    fn rsi_range_check() {
        let prices = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89,
            46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let v = rsi(&prices, 14);
        assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
    }

    #[test]
    fn rsi_zone_labels() {
        assert_eq!(rsi_zone(29.9), "OVERSOLD");
        assert_eq!(rsi_zone(30.0), "NEUTRAL");
        assert_eq!(rsi_zone(70.0), "NEUTRAL");
        assert_eq!(rsi_zone(70.1), "OVERBOUGHT");
    }
}
