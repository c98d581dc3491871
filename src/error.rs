use thiserror::Error;

/// Failure to obtain market data for a single pair.
///
/// Caught at the failover boundary; the indicator pipeline never sees it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidData(e.to_string())
        } else {
            Self::NetworkFailure(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidData(e.to_string())
    }
}

/// Rejected user input. Carries a user-facing message; nothing is mutated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("enter a valid price (a number greater than 0), got '{0}'")]
    InvalidPrice(String),

    #[error("enter a valid quantity (a number greater than 0), got '{0}'")]
    InvalidQuantity(String),

    #[error("unknown pair '{0}'")]
    UnknownPair(String),

    #[error("unknown mode '{0}': use advisor, day_trading or overview")]
    UnknownMode(String),

    #[error("timeframe must not be empty")]
    EmptyTimeframe,
}
