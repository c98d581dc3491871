// =============================================================================
// Signal Evaluator: fixed-weight vote over indicator readings
// =============================================================================
//
// Rules run in a fixed order and each appends its reason in that order:
//
//   1. RSI        <30 / >70 => ±rsi_weight, soft bands <40 / >60 => ±1
//   2. Bollinger  price below lower / above upper => ±bollinger_weight
//   3. Trend      short SMA vs long SMA => ±1, or ±2 past the strong-trend gap
//   4. Momentum   MACD histogram sign => ±1
//
// score >= thresholds.buy => BUY, score <= thresholds.sell => SELL, else HOLD.
// The evaluator keeps no state between calls.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::{gap_pct, IndicatorSet};
use crate::types::Signal;

use super::profile::SignalProfile;

/// Which rule cast a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Rsi,
    Bollinger,
    Trend,
    Momentum,
}

/// A single rule's contribution to the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub rule: Rule,
    pub points: i32,
    pub reason: String,
}

/// Result of evaluating one indicator snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub signal: Signal,
    /// Signed sum of all votes.
    pub score: i32,
    /// `|score|`.
    pub strength: u32,
    /// Reasons in rule-evaluation order.
    pub reasons: Vec<String>,
    pub votes: Vec<Vote>,
    pub indicators: IndicatorSet,
}

/// Evaluate `indicators` under `profile`.
pub fn evaluate(indicators: &IndicatorSet, profile: &SignalProfile) -> SignalResult {
    let mut votes = Vec::with_capacity(4);

    if let Some(v) = rsi_vote(indicators.rsi, profile) {
        votes.push(v);
    }
    if profile.use_bollinger {
        if let Some(v) = bollinger_vote(indicators, profile) {
            votes.push(v);
        }
    }
    if let Some(v) = trend_vote(indicators.sma_short, indicators.sma_long, profile) {
        votes.push(v);
    }
    if profile.use_macd {
        if let Some(v) = momentum_vote(indicators.macd_histogram, profile) {
            votes.push(v);
        }
    }

    let score: i32 = votes.iter().map(|v| v.points).sum();
    let signal = decide(score, profile);

    SignalResult {
        signal,
        score,
        strength: score.unsigned_abs(),
        reasons: votes.iter().map(|v| v.reason.clone()).collect(),
        votes,
        indicators: *indicators,
    }
}

/// Map a score onto a signal using the profile thresholds.
pub fn decide(score: i32, profile: &SignalProfile) -> Signal {
    if score >= profile.thresholds.buy {
        Signal::Buy
    } else if score <= profile.thresholds.sell {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

fn vote(rule: Rule, points: i32, reason: impl Into<String>) -> Option<Vote> {
    Some(Vote {
        rule,
        points,
        reason: reason.into(),
    })
}

fn rsi_vote(rsi: f64, profile: &SignalProfile) -> Option<Vote> {
    let w = profile.rsi_weight;
    if rsi < 30.0 {
        vote(Rule::Rsi, w, "RSI oversold (below 30)")
    } else if rsi > 70.0 {
        vote(Rule::Rsi, -w, "RSI overbought (above 70)")
    } else if profile.rsi_soft_bands && rsi < 40.0 {
        vote(Rule::Rsi, 1, "RSI on the low side (below 40)")
    } else if profile.rsi_soft_bands && rsi > 60.0 {
        vote(Rule::Rsi, -1, "RSI on the high side (above 60)")
    } else {
        None
    }
}

fn bollinger_vote(ind: &IndicatorSet, profile: &SignalProfile) -> Option<Vote> {
    let w = profile.bollinger_weight;
    if ind.price < ind.bollinger.lower {
        vote(Rule::Bollinger, w, "Price broke below the lower Bollinger band")
    } else if ind.price > ind.bollinger.upper {
        vote(Rule::Bollinger, -w, "Price broke above the upper Bollinger band")
    } else {
        None
    }
}

fn trend_vote(short: f64, long: f64, profile: &SignalProfile) -> Option<Vote> {
    let bullish = if short > long {
        true
    } else if short < long || profile.ties_vote_bearish {
        false
    } else {
        return None;
    };

    let gap = gap_pct(short, long).abs();
    let strong = profile.strong_trend_pct.is_some_and(|limit| gap > limit);

    match (bullish, strong) {
        (true, true) => vote(Rule::Trend, 2, "Strong uptrend (short SMA well above long SMA)"),
        (true, false) => vote(Rule::Trend, 1, "Uptrend (short SMA above long SMA)"),
        (false, true) => vote(Rule::Trend, -2, "Strong downtrend (short SMA well below long SMA)"),
        (false, false) => vote(Rule::Trend, -1, "Downtrend (short SMA below long SMA)"),
    }
}

fn momentum_vote(macd: f64, profile: &SignalProfile) -> Option<Vote> {
    if macd > 0.0 {
        vote(Rule::Momentum, 1, "MACD positive (bullish momentum)")
    } else if macd < 0.0 || profile.ties_vote_bearish {
        vote(Rule::Momentum, -1, "MACD negative (bearish momentum)")
    } else {
        None
    }
}
