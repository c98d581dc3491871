// =============================================================================
// Coincheck REST API Client: public ticker and order book endpoints
// =============================================================================
//
// Unauthenticated GETs only. When a CORS proxy is configured the target URL is
// passed URL-encoded in the proxy's `url` query parameter.
// =============================================================================

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, instrument};

use crate::error::FetchError;
use crate::feed::TickerSource;
use crate::market_data::{OrderBook, Ticker};

pub const DEFAULT_API_BASE: &str = "https://coincheck.com/api";

#[derive(Clone)]
pub struct CoincheckClient {
    api_base: String,
    cors_proxy: Option<String>,
    client: reqwest::Client,
}

impl CoincheckClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// # Arguments
    /// * `api_base`  : e.g. `https://coincheck.com/api`, no trailing slash needed.
    /// * `cors_proxy`: proxy endpoint taking the target in `?url=`, or `None`.
    /// * `timeout`   : per-request timeout.
    pub fn new(
        api_base: impl Into<String>,
        cors_proxy: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let api_base = api_base.into().trim_end_matches('/').to_string();
        debug!(api_base = %api_base, proxied = cors_proxy.is_some(), "CoincheckClient initialised");

        Ok(Self {
            api_base,
            cors_proxy,
            client,
        })
    }

    // -------------------------------------------------------------------------
    // URL helpers
    // -------------------------------------------------------------------------

    /// Full request URL for `{api_base}/{path}?pair={pair}`, wrapped in the
    /// proxy when one is set.
    pub fn endpoint(&self, path: &str, pair: &str) -> Result<Url, FetchError> {
        let target = Url::parse_with_params(&format!("{}/{path}", self.api_base), &[("pair", pair)])
            .map_err(|e| FetchError::NetworkFailure(format!("bad api url: {e}")))?;

        match &self.cors_proxy {
            Some(proxy) => Url::parse_with_params(proxy, &[("url", target.as_str())])
                .map_err(|e| FetchError::NetworkFailure(format!("bad proxy url: {e}"))),
            None => Ok(target),
        }
    }

    async fn get_json(&self, url: Url) -> Result<serde_json::Value, FetchError> {
        let resp = self.client.get(url.clone()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::NetworkFailure(format!(
                "GET {url} returned {status}"
            )));
        }

        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl TickerSource for CoincheckClient {
    /// GET /ticker?pair=P
    #[instrument(skip(self), name = "coincheck::fetch_ticker")]
    async fn fetch_ticker(&self, pair: &str) -> Result<Ticker, FetchError> {
        let url = self.endpoint("ticker", pair)?;
        let body = self.get_json(url).await?;
        let ticker = Ticker::from_json(&body)?;
        debug!(pair = %pair, last = ticker.last, "ticker received");
        Ok(ticker)
    }

    /// GET /order_books?pair=P
    #[instrument(skip(self), name = "coincheck::fetch_order_book")]
    async fn fetch_order_book(&self, pair: &str) -> Result<OrderBook, FetchError> {
        let url = self.endpoint("order_books", pair)?;
        let body = self.get_json(url).await?;
        let book = OrderBook::from_json(&body)?;
        debug!(pair = %pair, asks = book.asks.len(), bids = book.bids.len(), "order book received");
        Ok(book)
    }

    fn name(&self) -> &'static str {
        "coincheck"
    }
}

impl std::fmt::Debug for CoincheckClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoincheckClient")
            .field("api_base", &self.api_base)
            .field("cors_proxy", &self.cors_proxy)
            .finish()
    }
}
