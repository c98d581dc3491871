// =============================================================================
// Price Alerts: user thresholds checked on every day-trading tick
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::portfolio::parse_price;

/// Default match tolerance, in percent of the alert price.
pub const DEFAULT_TOLERANCE_PCT: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    /// Creation time in epoch milliseconds, unique within a book.
    pub id: i64,
    pub price: f64,
    pub pair: String,
    pub triggered: bool,
}

/// Settings that survive a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub alerts: Vec<PriceAlert>,
}

/// Ordered collection of alerts, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertBook {
    alerts: Vec<PriceAlert>,
}

impl AlertBook {
    pub fn new(alerts: Vec<PriceAlert>) -> Self {
        Self { alerts }
    }

    pub fn alerts(&self) -> &[PriceAlert] {
        &self.alerts
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Add an alert for `pair` at `price`.
    ///
    /// The id is `now_ms`, bumped past the newest existing id so two alerts
    /// created in the same millisecond stay distinct.
    pub fn add(&mut self, price: f64, pair: &str, now_ms: i64) -> Result<PriceAlert, InputError> {
        if !(price.is_finite() && price > 0.0) {
            return Err(InputError::InvalidPrice(price.to_string()));
        }
        let newest = self.alerts.iter().map(|a| a.id).max().unwrap_or(i64::MIN);
        let id = now_ms.max(newest.saturating_add(1));

        let alert = PriceAlert {
            id,
            price,
            pair: pair.to_string(),
            triggered: false,
        };
        self.alerts.push(alert.clone());
        Ok(alert)
    }

    /// Same as [`add`](Self::add) but from user-typed text.
    pub fn add_text(&mut self, text: &str, pair: &str, now_ms: i64) -> Result<PriceAlert, InputError> {
        let price = parse_price(text)?;
        self.add(price, pair, now_ms)
    }

    /// Returns whether an alert with `id` existed.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        self.alerts.len() != before
    }

    /// Mark every untriggered alert on `pair` within `tolerance_pct` of
    /// `price` as triggered, and return the newly triggered ones.
    ///
    /// An alert fires at most once.
    pub fn check(&mut self, pair: &str, price: f64, tolerance_pct: f64) -> Vec<PriceAlert> {
        let mut fired = Vec::new();
        for alert in self
            .alerts
            .iter_mut()
            .filter(|a| !a.triggered && a.pair == pair)
        {
            let threshold = alert.price * tolerance_pct / 100.0;
            if (price - alert.price).abs() <= threshold {
                alert.triggered = true;
                fired.push(alert.clone());
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_validates_price() {
        let mut book = AlertBook::default();
        assert!(book.add(0.0, "btc_jpy", 1).is_err());
        assert!(book.add(f64::NAN, "btc_jpy", 1).is_err());
        assert!(book.add_text("ten", "btc_jpy", 1).is_err());
        assert!(book.is_empty());
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut book = AlertBook::default();
        let a = book.add(100.0, "btc_jpy", 1_000).unwrap();
        let b = book.add(200.0, "btc_jpy", 1_000).unwrap();
        let c = book.add(300.0, "btc_jpy", 5_000).unwrap();
        assert_eq!(a.id, 1_000);
        assert_eq!(b.id, 1_001);
        assert_eq!(c.id, 5_000);
    }

    #[test]
    fn remove_by_id() {
        let mut book = AlertBook::default();
        let a = book.add(100.0, "btc_jpy", 10).unwrap();
        assert!(book.remove(a.id));
        assert!(!book.remove(a.id));
        assert!(book.is_empty());
    }

    #[test]
    fn check_fires_once_within_tolerance() {
        let mut book = AlertBook::default();
        book.add(10_000.0, "btc_jpy", 1).unwrap();
        book.add(10_000.0, "eth_jpy", 2).unwrap();

        // 0.1% of 10_000 = 10
        assert!(book.check("btc_jpy", 10_011.0, DEFAULT_TOLERANCE_PCT).is_empty());
        let fired = book.check("btc_jpy", 10_009.0, DEFAULT_TOLERANCE_PCT);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].pair, "btc_jpy");
        assert!(book.check("btc_jpy", 10_000.0, DEFAULT_TOLERANCE_PCT).is_empty());

        assert!(!book.alerts()[1].triggered);
    }

    #[test]
    fn settings_serialise_alerts_shape() {
        let settings = UserSettings {
            notifications_enabled: true,
            alerts: vec![PriceAlert {
                id: 1_700_000_000_000,
                price: 95.0,
                pair: "xrp_jpy".into(),
                triggered: false,
            }],
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["alerts"][0]["id"], 1_700_000_000_000_i64);
        assert_eq!(json["alerts"][0]["pair"], "xrp_jpy");
        let back: UserSettings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }
}
