// =============================================================================
// Demo Source: synthetic quotes around a per-pair base price
// =============================================================================
//
// price = base + (u - 0.5) * base * 0.02, u ~ U[0, 1)
// Each quote is independent of the previous one; there is no random walk.
// =============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::FetchError;
use crate::market_data::pairs;
use crate::market_data::{BookLevel, OrderBook, Ticker};

use super::TickerSource;

/// Total width of the price jitter, as a fraction of base.
const VARIATION: f64 = 0.02;
/// Levels generated per book side.
const BOOK_LEVELS: usize = 10;
/// Price step between consecutive book levels.
const BOOK_STEP: f64 = 0.001;

pub struct DemoSource {
    rng: Mutex<StdRng>,
    /// Last generated price per pair; the order book is centred on it.
    last: Mutex<HashMap<String, f64>>,
}

impl DemoSource {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic output for tests.
    #[cfg(test)]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            last: Mutex::new(HashMap::new()),
        }
    }

    pub fn ticker(&self, pair: &str) -> Ticker {
        let base = pairs::base_price(pair);
        let (u, vol) = {
            let mut rng = self.rng.lock();
            (rng.gen::<f64>(), rng.gen::<f64>())
        };
        let price = base + (u - 0.5) * base * VARIATION;
        self.last.lock().insert(pair.to_string(), price);

        Ticker {
            last: price,
            bid: Some(price * 0.999),
            ask: Some(price * 1.001),
            high: Some(price * 1.05),
            low: Some(price * 0.95),
            volume: Some(vol * 1000.0),
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
        }
    }

    /// Ten levels each side at 0.1 % steps from the last demo price (or the
    /// base price if none was generated yet).
    pub fn order_book(&self, pair: &str) -> OrderBook {
        let mid = self
            .last
            .lock()
            .get(pair)
            .copied()
            .unwrap_or_else(|| pairs::base_price(pair));

        let mut rng = self.rng.lock();
        let mut level = |sign: f64, i: usize| BookLevel {
            price: mid * (1.0 + sign * (i + 1) as f64 * BOOK_STEP),
            amount: rng.gen::<f64>() * 0.5 + 0.1,
        };

        let asks = (0..BOOK_LEVELS).map(|i| level(1.0, i)).collect();
        let bids = (0..BOOK_LEVELS).map(|i| level(-1.0, i)).collect();
        OrderBook { asks, bids }
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TickerSource for DemoSource {
    async fn fetch_ticker(&self, pair: &str) -> Result<Ticker, FetchError> {
        Ok(self.ticker(pair))
    }

    async fn fetch_order_book(&self, pair: &str) -> Result<OrderBook, FetchError> {
        Ok(self.order_book(pair))
    }

    fn name(&self) -> &'static str {
        "demo"
    }

    fn is_demo(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_stay_within_one_percent_of_base() {
        let demo = DemoSource::seeded(7);
        for _ in 0..500 {
            let t = demo.ticker("btc_jpy");
            assert!(t.last >= 8_500_000.0 * 0.99 && t.last <= 8_500_000.0 * 1.01);
            let vol = t.volume.unwrap();
            assert!((0.0..1000.0).contains(&vol));
            assert!(t.bid.unwrap() < t.last && t.ask.unwrap() > t.last);
        }
    }

    #[test]
    fn unknown_pair_uses_default_base() {
        let demo = DemoSource::seeded(1);
        let t = demo.ticker("zzz_jpy");
        assert!(t.last >= 990.0 && t.last <= 1010.0);
    }

    #[test]
    fn seeded_sources_repeat() {
        let a = DemoSource::seeded(42);
        let b = DemoSource::seeded(42);
        assert_eq!(a.ticker("eth_jpy").last, b.ticker("eth_jpy").last);
    }

    #[test]
    fn order_book_ladders_around_last_price() {
        let demo = DemoSource::seeded(3);
        let t = demo.ticker("xrp_jpy");
        let book = demo.order_book("xrp_jpy");
        assert_eq!(book.asks.len(), 10);
        assert_eq!(book.bids.len(), 10);
        assert!((book.asks[0].price - t.last * 1.001).abs() < 1e-9);
        assert!((book.bids[9].price - t.last * 0.99).abs() < 1e-9);
        assert!(book.asks.windows(2).all(|w| w[0].price < w[1].price));
        assert!(book.bids.windows(2).all(|w| w[0].price > w[1].price));
        assert!(book
            .asks
            .iter()
            .chain(book.bids.iter())
            .all(|l| l.amount >= 0.1 && l.amount < 0.6));
    }

    #[tokio::test]
    async fn trait_methods_never_fail() {
        let demo = DemoSource::seeded(9);
        assert!(demo.fetch_ticker("btc_jpy").await.is_ok());
        assert!(demo.fetch_order_book("btc_jpy").await.is_ok());
        assert_eq!(demo.name(), "demo");
    }
}
