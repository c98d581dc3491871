// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators behind the signal
// pipeline. Unlike an `Option`-returning API, every function here degrades to
// a defined value on short history (neutral RSI, last price for averages) so
// evaluation can run as soon as the caller's minimum window is met.

pub mod bollinger;
pub mod ema;
pub mod rsi;
pub mod sma;

use serde::{Deserialize, Serialize};

pub use bollinger::{bollinger, BollingerBands};
pub use ema::macd_histogram;
pub use rsi::rsi;
pub use sma::{gap_pct, sma};

/// Look-back windows for one indicator pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPeriods {
    pub rsi: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub bollinger: usize,
    pub bollinger_std_dev: f64,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            rsi: 14,
            sma_short: 7,
            sma_long: 25,
            bollinger: 20,
            bollinger_std_dev: 2.0,
        }
    }
}

/// Every indicator reading derived from one price snapshot.
///
/// Computed fresh on each evaluation and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    /// Most recent price in the snapshot.
    pub price: f64,
    pub rsi: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub macd_histogram: f64,
    pub bollinger: BollingerBands,
}

impl IndicatorSet {
    /// Run every indicator over `prices` (oldest first).
    ///
    /// Returns `None` only for an empty slice; there is no "current price" to
    /// evaluate against in that case.
    pub fn compute(prices: &[f64], periods: &IndicatorPeriods) -> Option<Self> {
        let price = *prices.last()?;
        Some(Self {
            price,
            rsi: rsi(prices, periods.rsi),
            sma_short: sma(prices, periods.sma_short),
            sma_long: sma(prices, periods.sma_long),
            macd_histogram: macd_histogram(prices),
            bollinger: bollinger(prices, periods.bollinger, periods.bollinger_std_dev),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_empty_is_none() {
        assert!(IndicatorSet::compute(&[], &IndicatorPeriods::default()).is_none());
    }

    #[test]
    fn compute_rising_series() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let set = IndicatorSet::compute(&prices, &IndicatorPeriods::default()).unwrap();
        assert_eq!(set.price, 129.0);
        assert_eq!(set.rsi, 100.0);
        assert!((set.sma_short - 126.0).abs() < 1e-10);
        assert!((set.sma_long - 117.0).abs() < 1e-10);
        assert!(set.macd_histogram > 0.0);
        assert!((set.bollinger.middle - 119.5).abs() < 1e-10);
    }

    #[test]
    fn compute_single_price_degrades_everywhere() {
        let set = IndicatorSet::compute(&[10.0], &IndicatorPeriods::default()).unwrap();
        assert_eq!(set.rsi, 50.0);
        assert_eq!(set.sma_short, 10.0);
        assert_eq!(set.sma_long, 10.0);
        assert_eq!(set.macd_histogram, 0.0);
        assert_eq!(set.bollinger.middle, 10.0);
    }
}
