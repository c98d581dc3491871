// =============================================================================
// Portfolio Tracker: unrealised P&L for a manually entered position
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// User-entered position. Either field may be blank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub entry_price: Option<f64>,
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PnlReport {
    pub current_price: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
}

impl PnlReport {
    pub fn is_profit(&self) -> bool {
        self.pnl >= 0.0
    }
}

/// Unrealised P&L of `quantity` units bought at `entry`, marked at `current`.
///
/// # Edge cases
/// - Any input missing, zero, negative or non-finite => `None`, which the
///   display renders as a placeholder.
pub fn compute_pnl(entry: Option<f64>, quantity: Option<f64>, current: Option<f64>) -> Option<PnlReport> {
    let entry = entry.filter(|v| usable(*v))?;
    let quantity = quantity.filter(|v| usable(*v))?;
    let current = current.filter(|v| usable(*v))?;

    Some(PnlReport {
        current_price: current,
        pnl: (current - entry) * quantity,
        pnl_percent: (current - entry) / entry * 100.0,
    })
}

fn usable(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Parse a user-typed price.
pub fn parse_price(text: &str) -> Result<f64, InputError> {
    parse_positive(text).ok_or_else(|| InputError::InvalidPrice(text.trim().to_string()))
}

/// Parse a user-typed quantity.
pub fn parse_quantity(text: &str) -> Result<f64, InputError> {
    parse_positive(text).ok_or_else(|| InputError::InvalidQuantity(text.trim().to_string()))
}

/// A finite number strictly greater than zero, or `None`.
pub fn parse_positive(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| usable(*v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profit_and_loss() {
        let up = compute_pnl(Some(100.0), Some(2.0), Some(110.0)).unwrap();
        assert!((up.pnl - 20.0).abs() < 1e-10);
        assert!((up.pnl_percent - 10.0).abs() < 1e-10);
        assert!(up.is_profit());

        let down = compute_pnl(Some(8_500_000.0), Some(0.01), Some(8_000_000.0)).unwrap();
        assert!((down.pnl - (-5_000.0)).abs() < 1e-6);
        assert!(!down.is_profit());
    }

    #[test]
    fn missing_or_zero_input_is_placeholder() {
        assert!(compute_pnl(None, Some(1.0), Some(1.0)).is_none());
        assert!(compute_pnl(Some(1.0), Some(0.0), Some(1.0)).is_none());
        assert!(compute_pnl(Some(1.0), Some(1.0), None).is_none());
        assert!(compute_pnl(Some(-5.0), Some(1.0), Some(1.0)).is_none());
        assert!(compute_pnl(Some(f64::NAN), Some(1.0), Some(1.0)).is_none());
    }

    #[test]
    fn text_parsing() {
        assert_eq!(parse_price(" 95.5 ").unwrap(), 95.5);
        assert_eq!(
            parse_price("abc").unwrap_err(),
            InputError::InvalidPrice("abc".into())
        );
        assert!(parse_price("0").is_err());
        assert!(parse_quantity("-1").is_err());
        assert!(parse_quantity("inf").is_err());
        assert_eq!(parse_quantity("0.25").unwrap(), 0.25);
    }
}
