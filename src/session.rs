// =============================================================================
// Session: per-instance single-pair context
// =============================================================================
//
// Owns everything the advisor / day-trading cycle mutates: the active pair and
// timeframe, that pair's price series, the last quote and the user's position.
// Switching pair or timeframe starts the series over.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InputError;
use crate::indicators::IndicatorSet;
use crate::market_data::pairs::display_name;
use crate::market_data::{PriceSample, PriceSeries, Ticker};
use crate::portfolio::{compute_pnl, PnlReport, Position};
use crate::signals::{evaluate, SignalProfile, SignalResult};
use crate::types::{AppMode, Signal};

pub const DEFAULT_TIMEFRAME: &str = "5m";

/// Price change produced by one ingested tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceMove {
    pub price: f64,
    pub previous: Option<f64>,
    pub change: f64,
    pub change_pct: f64,
}

/// Outcome of evaluating the session's series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PairEvaluation {
    /// Not enough history yet; the caller shows a progress message.
    Collecting { have: usize, need: usize },
    Ready(SignalResult),
}

/// Everything the display needs for the single-pair screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairView {
    pub pair: String,
    pub name: String,
    pub timeframe: String,
    pub price: Option<f64>,
    pub change_pct: Option<f64>,
    pub ticker: Option<Ticker>,
    pub history_len: usize,
    pub min_history: usize,
    pub signal: Option<SignalResult>,
    pub recommendation: Option<String>,
    pub pnl: Option<PnlReport>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub mode: AppMode,
    pair: String,
    timeframe: String,
    series: PriceSeries,
    last_change_pct: Option<f64>,
    last_ticker: Option<Ticker>,
    last_signal: Option<Signal>,
    /// Bumped whenever the series starts over.
    generation: u64,
    pub position: Position,
}

impl Session {
    pub fn new(mode: AppMode, pair: &str, history_limit: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            pair: pair.to_string(),
            timeframe: DEFAULT_TIMEFRAME.to_string(),
            series: PriceSeries::new(pair, history_limit),
            last_change_pct: None,
            last_ticker: None,
            last_signal: None,
            generation: 0,
            position: Position::default(),
        }
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn timeframe(&self) -> &str {
        &self.timeframe
    }

    /// Changes on every pair or timeframe selection, even to the same value.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn last_price(&self) -> Option<f64> {
        self.series.last().map(|s| s.price)
    }

    pub fn last_signal(&self) -> Option<Signal> {
        self.last_signal
    }

    /// Make `pair` active and start its history over.
    pub fn select_pair(&mut self, pair: &str) {
        self.pair = pair.to_string();
        self.series = PriceSeries::new(pair, self.series.capacity());
        self.generation += 1;
        self.clear_quote();
    }

    pub fn select_timeframe(&mut self, timeframe: &str) -> Result<(), InputError> {
        let timeframe = timeframe.trim();
        if timeframe.is_empty() {
            return Err(InputError::EmptyTimeframe);
        }
        self.timeframe = timeframe.to_string();
        self.series.reset();
        self.generation += 1;
        self.clear_quote();
        Ok(())
    }

    fn clear_quote(&mut self) {
        self.last_change_pct = None;
        self.last_ticker = None;
        self.last_signal = None;
    }

    /// Append the ticker's last price and report the move against the
    /// previous tick.
    pub fn ingest(&mut self, ticker: Ticker, at: DateTime<Utc>) -> PriceMove {
        let price = ticker.last;
        let previous = self.last_price();
        let (change, change_pct) = match previous {
            Some(prev) if prev != 0.0 => (price - prev, (price - prev) / prev * 100.0),
            _ => (0.0, 0.0),
        };

        self.series.append(PriceSample::new(price, at));
        self.last_change_pct = previous.map(|_| change_pct);
        self.last_ticker = Some(ticker);

        PriceMove {
            price,
            previous,
            change,
            change_pct,
        }
    }

    pub fn evaluate(&self, profile: &SignalProfile) -> PairEvaluation {
        let have = self.series.len();
        if have < profile.min_history {
            return PairEvaluation::Collecting {
                have,
                need: profile.min_history,
            };
        }
        match IndicatorSet::compute(&self.series.values(), &profile.periods()) {
            Some(indicators) => PairEvaluation::Ready(evaluate(&indicators, profile)),
            None => PairEvaluation::Collecting {
                have,
                need: profile.min_history,
            },
        }
    }

    /// Remember the latest signal. Returns `true` when it moved into an
    /// actionable state (buy or sell) from anything else.
    pub fn record_signal(&mut self, signal: Signal) -> bool {
        let previous = self.last_signal.replace(signal);
        signal.is_actionable() && previous != Some(signal)
    }

    pub fn pnl(&self) -> Option<PnlReport> {
        compute_pnl(self.position.entry_price, self.position.quantity, self.last_price())
    }

    pub fn view(&self, evaluation: &PairEvaluation, min_history: usize) -> PairView {
        let signal = match evaluation {
            PairEvaluation::Ready(result) => Some(result.clone()),
            PairEvaluation::Collecting { .. } => None,
        };
        PairView {
            pair: self.pair.clone(),
            name: display_name(&self.pair),
            timeframe: self.timeframe.clone(),
            price: self.last_price(),
            change_pct: self.last_change_pct,
            ticker: self.last_ticker.clone(),
            history_len: self.series.len(),
            min_history,
            recommendation: signal.as_ref().map(|s| s.signal.recommendation().to_string()),
            signal,
            pnl: self.pnl(),
        }
    }
}
