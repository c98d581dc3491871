// =============================================================================
// Signal Profiles: per-variant weights, periods and thresholds
// =============================================================================
//
// The advisor, day-trading and overview variants run the same evaluator with
// different knobs. A profile in runtime_config.json is read as a patch over
// its own variant's preset, so it only overrides the fields it names.
// =============================================================================

use serde::{Deserialize, Deserializer, Serialize};

use crate::indicators::IndicatorPeriods;
use crate::types::AppMode;

/// Score boundaries for the buy / sell decision.
///
/// `score >= buy` is a buy and `score <= sell` is a sell; `sell` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub buy: i32,
    pub sell: i32,
}

impl Thresholds {
    pub fn symmetric(magnitude: i32) -> Self {
        Self {
            buy: magnitude,
            sell: -magnitude,
        }
    }
}

/// Knobs for one evaluator variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalProfile {
    pub rsi_period: usize,
    pub sma_short: usize,
    pub sma_long: usize,

    /// Votes cast by RSI below 30 / above 70.
    pub rsi_weight: i32,
    /// Adds ±1 for RSI below 40 / above 60.
    pub rsi_soft_bands: bool,

    /// Gap (in %) between the short and long SMA above which the trend vote
    /// doubles. `None` disables the strong-trend tier.
    pub strong_trend_pct: Option<f64>,

    pub use_macd: bool,

    pub use_bollinger: bool,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub bollinger_weight: i32,

    /// When true, an exact SMA or MACD tie votes bearish; when false a tie
    /// casts no vote.
    pub ties_vote_bearish: bool,

    pub thresholds: Thresholds,

    /// History length required before evaluating at all.
    pub min_history: usize,
}

impl SignalProfile {
    /// Single-pair advisor: RSI(±2) + SMA 7/25 + MACD, threshold 2.
    pub fn advisor() -> Self {
        Self {
            rsi_period: 14,
            sma_short: 7,
            sma_long: 25,
            rsi_weight: 2,
            rsi_soft_bands: false,
            strong_trend_pct: None,
            use_macd: true,
            use_bollinger: false,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            bollinger_weight: 2,
            ties_vote_bearish: false,
            thresholds: Thresholds::symmetric(2),
            min_history: 14,
        }
    }

    /// Day trading: RSI(±2) + Bollinger(±2) + SMA 5/20, threshold 2.
    pub fn day_trading() -> Self {
        Self {
            sma_short: 5,
            sma_long: 20,
            use_macd: false,
            use_bollinger: true,
            ties_vote_bearish: true,
            min_history: 20,
            ..Self::advisor()
        }
    }

    /// Multi-pair overview: RSI(±3, soft bands) + tiered trend + MACD,
    /// threshold 3.
    pub fn overview() -> Self {
        Self {
            rsi_weight: 3,
            rsi_soft_bands: true,
            strong_trend_pct: Some(2.0),
            ties_vote_bearish: true,
            thresholds: Thresholds::symmetric(3),
            ..Self::advisor()
        }
    }

    pub fn periods(&self) -> IndicatorPeriods {
        IndicatorPeriods {
            rsi: self.rsi_period,
            sma_short: self.sma_short,
            sma_long: self.sma_long,
            bollinger: self.bollinger_period,
            bollinger_std_dev: self.bollinger_std_dev,
        }
    }
}

/// Fields named in a config profile. Anything left out keeps the preset.
#[derive(Debug, Deserialize)]
struct ProfilePatch {
    rsi_period: Option<usize>,
    sma_short: Option<usize>,
    sma_long: Option<usize>,
    rsi_weight: Option<i32>,
    rsi_soft_bands: Option<bool>,
    /// Outer `None` when absent; `Some(None)` for an explicit `null`.
    #[serde(default, deserialize_with = "present")]
    strong_trend_pct: Option<Option<f64>>,
    use_macd: Option<bool>,
    use_bollinger: Option<bool>,
    bollinger_period: Option<usize>,
    bollinger_std_dev: Option<f64>,
    bollinger_weight: Option<i32>,
    ties_vote_bearish: Option<bool>,
    thresholds: Option<Thresholds>,
    min_history: Option<usize>,
}

impl ProfilePatch {
    fn apply(self, base: SignalProfile) -> SignalProfile {
        SignalProfile {
            rsi_period: self.rsi_period.unwrap_or(base.rsi_period),
            sma_short: self.sma_short.unwrap_or(base.sma_short),
            sma_long: self.sma_long.unwrap_or(base.sma_long),
            rsi_weight: self.rsi_weight.unwrap_or(base.rsi_weight),
            rsi_soft_bands: self.rsi_soft_bands.unwrap_or(base.rsi_soft_bands),
            strong_trend_pct: self.strong_trend_pct.unwrap_or(base.strong_trend_pct),
            use_macd: self.use_macd.unwrap_or(base.use_macd),
            use_bollinger: self.use_bollinger.unwrap_or(base.use_bollinger),
            bollinger_period: self.bollinger_period.unwrap_or(base.bollinger_period),
            bollinger_std_dev: self.bollinger_std_dev.unwrap_or(base.bollinger_std_dev),
            bollinger_weight: self.bollinger_weight.unwrap_or(base.bollinger_weight),
            ties_vote_bearish: self.ties_vote_bearish.unwrap_or(base.ties_vote_bearish),
            thresholds: self.thresholds.unwrap_or(base.thresholds),
            min_history: self.min_history.unwrap_or(base.min_history),
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn overlay<'de, D>(deserializer: D, preset: SignalProfile) -> Result<SignalProfile, D::Error>
where
    D: Deserializer<'de>,
{
    ProfilePatch::deserialize(deserializer).map(|patch| patch.apply(preset))
}

fn advisor_overlay<'de, D: Deserializer<'de>>(d: D) -> Result<SignalProfile, D::Error> {
    overlay(d, SignalProfile::advisor())
}

fn day_trading_overlay<'de, D: Deserializer<'de>>(d: D) -> Result<SignalProfile, D::Error> {
    overlay(d, SignalProfile::day_trading())
}

fn overview_overlay<'de, D: Deserializer<'de>>(d: D) -> Result<SignalProfile, D::Error> {
    overlay(d, SignalProfile::overview())
}

/// The three presets, individually overridable from config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSet {
    #[serde(default = "SignalProfile::advisor", deserialize_with = "advisor_overlay")]
    pub advisor: SignalProfile,
    #[serde(default = "SignalProfile::day_trading", deserialize_with = "day_trading_overlay")]
    pub day_trading: SignalProfile,
    #[serde(default = "SignalProfile::overview", deserialize_with = "overview_overlay")]
    pub overview: SignalProfile,
}

impl ProfileSet {
    pub fn get(&self, mode: AppMode) -> &SignalProfile {
        match mode {
            AppMode::Advisor => &self.advisor,
            AppMode::DayTrading => &self.day_trading,
            AppMode::Overview => &self.overview,
        }
    }
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self {
            advisor: SignalProfile::advisor(),
            day_trading: SignalProfile::day_trading(),
            overview: SignalProfile::overview(),
        }
    }
}
