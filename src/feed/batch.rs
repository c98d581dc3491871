use std::time::Duration;

use futures_util::future::join_all;
use tracing::debug;

use crate::market_data::Ticker;

use super::TickerSource;

/// Fetch tickers for `pairs`, `batch_size` at a time.
///
/// Pairs inside a batch are fetched concurrently; `delay` is slept between
/// batches (not after the last). A failed pair yields `None` in its slot and
/// does not affect the others. Output order matches `pairs`.
pub async fn fetch_batched<S>(
    source: &S,
    pairs: &[String],
    batch_size: usize,
    delay: Duration,
) -> Vec<(String, Option<Ticker>)>
where
    S: TickerSource + ?Sized,
{
    let mut out = Vec::with_capacity(pairs.len());
    let chunks: Vec<&[String]> = pairs.chunks(batch_size.max(1)).collect();
    let n_chunks = chunks.len();

    for (i, chunk) in chunks.into_iter().enumerate() {
        let results = join_all(chunk.iter().map(|pair| source.fetch_ticker(pair))).await;

        for (pair, result) in chunk.iter().zip(results) {
            match result {
                Ok(ticker) => out.push((pair.clone(), Some(ticker))),
                Err(e) => {
                    debug!(pair = %pair, error = %e, "overview fetch failed");
                    out.push((pair.clone(), None));
                }
            }
        }

        if i + 1 < n_chunks && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    out
}
