// =============================================================================
// Shared types used across the signal engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Discrete trading recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Short label for notifications and badges.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "Buy signal",
            Self::Sell => "Sell signal",
            Self::Hold => "Wait and see",
        }
    }

    /// Advisory sentence shown alongside the signal.
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Buy => {
                "Consider entering a position. Start small and set a stop-loss level."
            }
            Self::Sell => {
                "Consider taking profit or cutting losses. Watch your position size."
            }
            Self::Hold => "No clear signal right now. Keep watching the market.",
        }
    }

    /// Whether the signal asks the user to act.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::Hold)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
            Self::Hold => write!(f, "hold"),
        }
    }
}

/// Overview bucket for the magnitude of a buy/sell score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Weak,
    Moderate,
    Strong,
}

impl SignalStrength {
    /// Bucket a signed score: |score| >= 5 strong, == 4 moderate, otherwise
    /// weak. Hold signals are always weak.
    pub fn bucket(signal: Signal, score: i32) -> Self {
        if signal == Signal::Hold {
            return Self::Weak;
        }
        match score.unsigned_abs() {
            s if s >= 5 => Self::Strong,
            4 => Self::Moderate,
            _ => Self::Weak,
        }
    }
}

/// Which app variant the engine is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    /// Single pair, slow refresh, RSI + SMA + MACD.
    Advisor,
    /// Single pair, fast refresh, RSI + Bollinger + SMA, alerts and P&L.
    DayTrading,
    /// Every tracked pair, ranked by signal strength.
    Overview,
}

impl Default for AppMode {
    fn default() -> Self {
        Self::Overview
    }
}

impl std::fmt::Display for AppMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Advisor => write!(f, "advisor"),
            Self::DayTrading => write!(f, "day_trading"),
            Self::Overview => write!(f, "overview"),
        }
    }
}

impl std::str::FromStr for AppMode {
    type Err = crate::error::InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "advisor" => Ok(Self::Advisor),
            "day_trading" | "daytrading" => Ok(Self::DayTrading),
            "overview" => Ok(Self::Overview),
            other => Err(crate::error::InputError::UnknownMode(other.to_string())),
        }
    }
}

/// Upstream connection state shown in the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    /// Connected, but serving synthetic demo data.
    Demo,
    Disconnected,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::Connecting
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Demo => write!(f, "Demo mode"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}
