// =============================================================================
// Signals Module
// =============================================================================
//
// Indicator readings to trading decisions:
// - Per-variant profiles (weights, periods, thresholds)
// - Fixed-weight vote evaluator
// - Cross-pair overview ranking

pub mod evaluator;
pub mod profile;
pub mod ranker;

pub use evaluator::{evaluate, SignalResult};
pub use profile::{ProfileSet, SignalProfile};
pub use ranker::{rank, OverviewReport};
