// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ). σ is the population standard deviation of the
// last `period` closes around the middle band.

use serde::{Deserialize, Serialize};

use super::sma::sma;

/// Result of a Bollinger Band calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Position of `price` inside the band as a percentage (0 = lower band,
    /// 100 = upper band). `None` when the band has zero width.
    pub fn position_pct(&self, price: f64) -> Option<f64> {
        let width = self.upper - self.lower;
        if width == 0.0 {
            return None;
        }
        Some((price - self.lower) / width * 100.0)
    }
}

/// Calculate Bollinger Bands over the last `period` prices.
///
/// Never fails. With fewer than `period` prices the middle band degrades to
/// the last price (like [`sma`]) and the deviation is taken over whatever
/// prices are available, still divided by `period`.
pub fn bollinger(prices: &[f64], period: usize, num_std: f64) -> BollingerBands {
    let middle = sma(prices, period);
    if period == 0 {
        return BollingerBands {
            upper: middle,
            middle,
            lower: middle,
        };
    }

    let window = &prices[prices.len().saturating_sub(period)..];
    let variance = window.iter().map(|p| (p - middle).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    BollingerBands {
        upper: middle + std_dev * num_std,
        middle,
        lower: middle - std_dev * num_std,
    }
}
