use serde::{Deserialize, Serialize};

/// Direction of a prediction against the entry price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

/// Currencies a stake can be denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usdt,
    Sol,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usdt => "USDT",
            Currency::Sol => "SOL",
        }
    }

    /// Allowed stake range for this currency
    pub fn limits(&self) -> StakeLimits {
        match self {
            Currency::Usdt => StakeLimits {
                min: 5.0,
                max: 1_000.0,
            },
            Currency::Sol => StakeLimits { min: 0.05, max: 10.0 },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StakeLimits {
    pub min: f64,
    pub max: f64,
}

/// Terminal outcome of a settled prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetResult {
    Win,
    Lose,
}

/// User-facing rejection reasons. Every failed operation maps to exactly one
/// of these and leaves engine state untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BetError {
    #[error("connect your wallet to place a prediction")]
    NotConnected,
    #[error("enter a valid stake amount")]
    InvalidAmount,
    #[error("minimum stake is {min} {currency}")]
    BelowMinimum { min: f64, currency: &'static str },
    #[error("maximum stake is {max} {currency}")]
    AboveMaximum { max: f64, currency: &'static str },
    #[error("no live price for this market yet")]
    NoLivePrice,
    #[error("unknown market")]
    UnknownInstrument,
    #[error("too late to cancel this prediction")]
    TooLateToCancel,
    #[error("prediction not found")]
    UnknownBet,
    #[error("no streak bonus to claim")]
    NothingToClaim,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub port: u16,
    pub feed_enabled: bool,
    pub binance_ws_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./alphapulse.db".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8090".to_string())
            .parse()
            .unwrap_or(8090);

        let feed_enabled = std::env::var("FEED_ENABLED")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(true);

        let binance_ws_url = std::env::var("BINANCE_WS_URL")
            .unwrap_or_else(|_| "wss://stream.binance.com:9443".to_string());

        Ok(Self {
            database_path,
            port,
            feed_enabled,
            binance_ws_url,
        })
    }
}
