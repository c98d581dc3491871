// =============================================================================
// Overview Ranker: cross-pair buy/sell leaderboard
// =============================================================================
//
// Every pair with enough history is evaluated under the overview profile and
// turned into a Recommendation. Buys and sells are then sorted by score
// (stable, so equal scores keep the configured pair order) and cut to top N.
// The report is rebuilt from scratch each cycle.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSet;
use crate::types::{Signal, SignalStrength};

use super::evaluator::evaluate;
use super::profile::SignalProfile;

/// Reasons carried per recommendation.
const MAX_REASONS: usize = 2;

/// One pair's line in the overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub pair: String,
    pub signal: Signal,
    pub strength: SignalStrength,
    /// Absolute score.
    pub score: u32,
    pub reasons: Vec<String>,
    pub price: f64,
    /// Change vs the previous sample, in percent. 0 with a single sample.
    pub price_change_pct: f64,
    pub rsi: f64,
    pub sma_short: f64,
    pub sma_long: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewReport {
    pub top_buys: Vec<Recommendation>,
    pub top_sells: Vec<Recommendation>,
    pub buy_count: usize,
    pub sell_count: usize,
    pub hold_count: usize,
    /// Pairs that had enough history to be evaluated.
    pub analysed: usize,
    pub generated_at: DateTime<Utc>,
}

/// Evaluate a single pair's history.
///
/// # Edge cases
/// - Fewer than `profile.min_history` prices => `None` (still collecting).
/// - One sample only => `price_change_pct` is 0.
/// - Previous price of 0 => `price_change_pct` is 0.
pub fn recommend(pair: &str, prices: &[f64], profile: &SignalProfile) -> Option<Recommendation> {
    if prices.len() < profile.min_history {
        return None;
    }
    let indicators = IndicatorSet::compute(prices, &profile.periods())?;
    let result = evaluate(&indicators, profile);

    let price_change_pct = match prices {
        [.., prev, last] if *prev != 0.0 => (last - prev) / prev * 100.0,
        _ => 0.0,
    };

    Some(Recommendation {
        pair: pair.to_string(),
        signal: result.signal,
        strength: SignalStrength::bucket(result.signal, result.score),
        score: result.strength,
        reasons: result.reasons.into_iter().take(MAX_REASONS).collect(),
        price: indicators.price,
        price_change_pct,
        rsi: indicators.rsi,
        sma_short: indicators.sma_short,
        sma_long: indicators.sma_long,
    })
}

/// Evaluate every `(pair, prices)` entry, in the order given, and rank.
pub fn rank<'a, I>(entries: I, profile: &SignalProfile, top_n: usize) -> OverviewReport
where
    I: IntoIterator<Item = (&'a str, &'a [f64])>,
{
    let recs = entries
        .into_iter()
        .filter_map(|(pair, prices)| recommend(pair, prices, profile))
        .collect();
    rank_recommendations(recs, top_n)
}

/// Partition, sort and truncate already-built recommendations.
pub fn rank_recommendations(recs: Vec<Recommendation>, top_n: usize) -> OverviewReport {
    let analysed = recs.len();
    let mut buys = Vec::new();
    let mut sells = Vec::new();
    let mut hold_count = 0;

    for rec in recs {
        match rec.signal {
            Signal::Buy => buys.push(rec),
            Signal::Sell => sells.push(rec),
            Signal::Hold => hold_count += 1,
        }
    }

    let buy_count = buys.len();
    let sell_count = sells.len();

    // sort_by is stable
    buys.sort_by(|a, b| b.score.cmp(&a.score));
    sells.sort_by(|a, b| b.score.cmp(&a.score));
    buys.truncate(top_n);
    sells.truncate(top_n);

    OverviewReport {
        top_buys: buys,
        top_sells: sells,
        buy_count,
        sell_count,
        hold_count,
        analysed,
        generated_at: Utc::now(),
    }
}
