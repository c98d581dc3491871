// =============================================================================
// Market data feed: source abstraction, demo generator, failover, batching
// =============================================================================
//
// Everything that produces tickers implements `TickerSource`. The engine only
// ever talks to a `FailoverSource`, which hides the live/demo switch.

pub mod batch;
pub mod demo;
pub mod failover;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::market_data::{OrderBook, Ticker};

pub use batch::fetch_batched;
pub use demo::DemoSource;
pub use failover::FailoverSource;

/// Anything that can quote a pair.
#[async_trait]
pub trait TickerSource: Send + Sync {
    async fn fetch_ticker(&self, pair: &str) -> Result<Ticker, FetchError>;

    async fn fetch_order_book(&self, pair: &str) -> Result<OrderBook, FetchError>;

    /// Short label for logs and the status line.
    fn name(&self) -> &'static str;

    /// Whether quotes are synthetic.
    fn is_demo(&self) -> bool {
        false
    }
}
