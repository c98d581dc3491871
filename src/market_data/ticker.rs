// =============================================================================
// Exchange payloads: ticker and order book
// =============================================================================
//
// Coincheck sends most numbers as JSON strings ("8500000.0") but some fields
// as plain numbers, so everything goes through `parse_str_f64`.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Latest quote for one pair. Only `last` is required on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub last: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
    /// Exchange timestamp as sent (seconds or milliseconds), if any.
    pub timestamp: Option<i64>,
}

impl Ticker {
    /// Parse a `/ticker` response body.
    ///
    /// # Edge cases
    /// - Missing, non-numeric or non-positive `last` => `InvalidData`.
    /// - Malformed optional fields are dropped rather than failing the tick.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, FetchError> {
        let last = body
            .get("last")
            .ok_or_else(|| FetchError::InvalidData("ticker missing 'last'".into()))
            .and_then(parse_str_f64)?;
        if !(last.is_finite() && last > 0.0) {
            return Err(FetchError::InvalidData(format!(
                "ticker 'last' must be positive, got {last}"
            )));
        }

        let opt = |name: &str| body.get(name).and_then(|v| parse_str_f64(v).ok());

        Ok(Self {
            last,
            bid: opt("bid"),
            ask: opt("ask"),
            high: opt("high"),
            low: opt("low"),
            volume: opt("volume"),
            timestamp: body.get("timestamp").and_then(|v| {
                v.as_i64()
                    .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            }),
        })
    }
}

/// One `[price, amount]` level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub amount: f64,
}

/// Raw order book, best level first on both sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub asks: Vec<BookLevel>,
    pub bids: Vec<BookLevel>,
}

impl OrderBook {
    /// Parse an `/order_books` response body.
    ///
    /// Levels that are not two numeric entries are skipped; a body without
    /// `asks` and `bids` arrays is `InvalidData`.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, FetchError> {
        let side = |name: &str| -> Result<Vec<BookLevel>, FetchError> {
            let levels = body
                .get(name)
                .and_then(|v| v.as_array())
                .ok_or_else(|| FetchError::InvalidData(format!("order book missing '{name}'")))?;
            Ok(levels.iter().filter_map(parse_level).collect())
        };

        Ok(Self {
            asks: side("asks")?,
            bids: side("bids")?,
        })
    }
}

fn parse_level(level: &serde_json::Value) -> Option<BookLevel> {
    let pair = level.as_array()?;
    let price = parse_str_f64(pair.first()?).ok()?;
    let amount = parse_str_f64(pair.get(1)?).ok()?;
    Some(BookLevel { price, amount })
}

/// Accept either a JSON number or a numeric string.
pub(crate) fn parse_str_f64(val: &serde_json::Value) -> Result<f64, FetchError> {
    if let Some(s) = val.as_str() {
        s.trim()
            .parse::<f64>()
            .map_err(|_| FetchError::InvalidData(format!("failed to parse '{s}' as f64")))
    } else if let Some(n) = val.as_f64() {
        Ok(n)
    } else {
        Err(FetchError::InvalidData(format!(
            "expected string or number, got: {val}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ticker_accepts_strings_and_numbers() {
        let body = json!({
            "last": "8500000.0",
            "bid": 8499000.0,
            "ask": "8501000",
            "high": "8700000",
            "low": "8300000",
            "volume": "123.4567",
            "timestamp": 1700000000
        });
        let t = Ticker::from_json(&body).unwrap();
        assert_eq!(t.last, 8_500_000.0);
        assert_eq!(t.bid, Some(8_499_000.0));
        assert_eq!(t.ask, Some(8_501_000.0));
        assert_eq!(t.timestamp, Some(1_700_000_000));
    }

    #[test]
    fn ticker_without_last_is_invalid() {
        let err = Ticker::from_json(&json!({ "bid": "1" })).unwrap_err();
        assert!(matches!(err, FetchError::InvalidData(_)));
    }

    #[test]
    fn ticker_with_bad_last_is_invalid() {
        assert!(Ticker::from_json(&json!({ "last": "abc" })).is_err());
        assert!(Ticker::from_json(&json!({ "last": "0" })).is_err());
        assert!(Ticker::from_json(&json!({ "last": null })).is_err());
    }

    #[test]
    fn ticker_drops_malformed_optionals() {
        let t = Ticker::from_json(&json!({ "last": 95, "bid": "n/a" })).unwrap();
        assert_eq!(t.last, 95.0);
        assert_eq!(t.bid, None);
        assert_eq!(t.volume, None);
    }

    #[test]
    fn order_book_parses_levels() {
        let body = json!({
            "asks": [["101.0", "0.5"], ["102.0", "1.0"], ["bad"]],
            "bids": [["99.0", "0.25"], [98.0, 2.0]]
        });
        let book = OrderBook::from_json(&body).unwrap();
        assert_eq!(book.asks.len(), 2);
        assert_eq!(book.bids[1], BookLevel { price: 98.0, amount: 2.0 });
    }

    #[test]
    fn order_book_requires_both_sides() {
        assert!(OrderBook::from_json(&json!({ "asks": [] })).is_err());
    }
}
