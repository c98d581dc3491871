// =============================================================================
// Failover Source: live feed with a one-way switch to demo data
// =============================================================================
//
// Consecutive live failures are counted; a success resets the count. When the
// count reaches `demo_after_failures` the source flips to demo for the rest of
// the process, announces it once and never tries the live feed again.
// A threshold of 0 disables the switch.
// =============================================================================

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::market_data::{OrderBook, Ticker};
use crate::ports::NotificationSink;

use super::demo::DemoSource;
use super::TickerSource;

pub const DEMO_BANNER: &str = "Demo mode: the exchange API is unreachable, showing simulated prices";

pub struct FailoverSource {
    live: Arc<dyn TickerSource>,
    demo: DemoSource,
    notifier: Arc<dyn NotificationSink>,
    demo_after_failures: u32,
    failures: AtomicU32,
    demo_mode: AtomicBool,
}

impl FailoverSource {
    pub fn new(
        live: Arc<dyn TickerSource>,
        demo: DemoSource,
        notifier: Arc<dyn NotificationSink>,
        demo_after_failures: u32,
    ) -> Self {
        Self {
            live,
            demo,
            notifier,
            demo_after_failures,
            failures: AtomicU32::new(0),
            demo_mode: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub fn consecutive_failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Switch to demo now. Returns whether this call did the switch.
    pub fn enter_demo(&self, reason: &str) -> bool {
        if self.demo_mode.swap(true, Ordering::SeqCst) {
            return false;
        }
        warn!(
            live = self.live.name(),
            reason,
            "switching to demo mode for the rest of the session"
        );
        self.notifier.banner(DEMO_BANNER);
        true
    }

    fn record_failure(&self, pair: &str, err: &FetchError) -> bool {
        let count = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
        warn!(pair = %pair, error = %err, failures = count, "live ticker fetch failed");
        self.demo_after_failures > 0 && count >= self.demo_after_failures
    }
}

#[async_trait]
impl TickerSource for FailoverSource {
    async fn fetch_ticker(&self, pair: &str) -> Result<Ticker, FetchError> {
        if self.is_demo() {
            return Ok(self.demo.ticker(pair));
        }

        match self.live.fetch_ticker(pair).await {
            Ok(ticker) => {
                self.failures.store(0, Ordering::SeqCst);
                Ok(ticker)
            }
            Err(e) => {
                if self.record_failure(pair, &e) {
                    self.enter_demo(&e.to_string());
                    Ok(self.demo.ticker(pair))
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn fetch_order_book(&self, pair: &str) -> Result<OrderBook, FetchError> {
        if self.is_demo() {
            return Ok(self.demo.order_book(pair));
        }

        match self.live.fetch_order_book(pair).await {
            Ok(book) => Ok(book),
            // The ticker may have flipped us to demo while this was in flight.
            Err(_) if self.is_demo() => Ok(self.demo.order_book(pair)),
            Err(e) => {
                debug!(pair = %pair, error = %e, "order book fetch failed");
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        if self.is_demo() {
            self.demo.name()
        } else {
            self.live.name()
        }
    }

    fn is_demo(&self) -> bool {
        self.demo_mode.load(Ordering::SeqCst)
    }
}
