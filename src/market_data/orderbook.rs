// =============================================================================
// Order Book Summary: top-of-book depth view
// =============================================================================

use serde::{Deserialize, Serialize};

use super::ticker::{BookLevel, OrderBook};

/// Default number of levels shown per side.
pub const DEFAULT_DEPTH: usize = 5;

/// One displayed level with the running amount from the best price outward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRow {
    pub price: f64,
    pub amount: f64,
    pub cumulative: f64,
}

/// Display-ready order book for one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSummary {
    pub pair: String,
    /// Highest price first, so the best ask sits next to the best bid.
    pub asks: Vec<DepthRow>,
    /// Best (highest) bid first.
    pub bids: Vec<DepthRow>,
    pub best_bid: f64,
    pub best_ask: f64,
    pub spread_bps: f64,
    /// (bid depth - ask depth) / total, in [-1, +1].
    pub imbalance: f64,
}

impl OrderBookSummary {
    /// Summarise the top `depth` levels of each side.
    ///
    /// # Edge cases
    /// - An empty side yields a best price of 0 and no rows.
    /// - Spread is 0 when the mid price is not positive.
    /// - Imbalance is 0 when both sides are empty.
    pub fn from_book(pair: &str, book: &OrderBook, depth: usize) -> Self {
        let mut asks = cumulative_rows(&book.asks, depth);
        let bids = cumulative_rows(&book.bids, depth);

        let best_ask = book.asks.first().map_or(0.0, |l| l.price);
        let best_bid = book.bids.first().map_or(0.0, |l| l.price);

        let mid = (best_bid + best_ask) / 2.0;
        let spread_bps = if mid > 0.0 && best_bid > 0.0 && best_ask > 0.0 {
            ((best_ask - best_bid) / mid) * 10_000.0
        } else {
            0.0
        };

        let ask_depth = asks.last().map_or(0.0, |r| r.cumulative);
        let bid_depth = bids.last().map_or(0.0, |r| r.cumulative);
        let total_depth = bid_depth + ask_depth;
        let imbalance = if total_depth > 0.0 {
            (bid_depth - ask_depth) / total_depth
        } else {
            0.0
        };

        asks.reverse();

        Self {
            pair: pair.to_string(),
            asks,
            bids,
            best_bid,
            best_ask,
            spread_bps,
            imbalance,
        }
    }
}

fn cumulative_rows(levels: &[BookLevel], depth: usize) -> Vec<DepthRow> {
    let mut running = 0.0;
    levels
        .iter()
        .take(depth)
        .map(|l| {
            running += l.amount;
            DepthRow {
                price: l.price,
                amount: l.amount,
                cumulative: running,
            }
        })
        .collect()
}
