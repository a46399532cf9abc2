use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::instruments::Instrument;
use crate::models::{BetError, BetResult, Currency, Direction};

/// Fixed window between placement and expiry
pub const BET_WINDOW_SECS: i64 = 5 * 60;
/// Grace period during which a placed bet may still be withdrawn
pub const CANCEL_WINDOW_SECS: i64 = 20;

/// An open directional wager. Identity for cancellation is the
/// (instrument_id, placed_at_ms) pair since several bets on the same
/// instrument can be live at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveBet {
    pub instrument_id: u32,
    pub direction: Direction,
    /// Stake exactly as submitted, e.g. "100"
    pub amount: String,
    pub currency: Currency,
    pub placed_at_ms: i64,
    pub expires_at_ms: i64,
    pub entry_price: f64,
}

impl ActiveBet {
    pub fn stake(&self) -> f64 {
        self.amount.trim().parse().unwrap_or(0.0)
    }

    /// Whole seconds until expiry, clamped at zero
    pub fn time_left_secs(&self, now: DateTime<Utc>) -> i64 {
        ((self.expires_at_ms - now.timestamp_millis()) / 1000).max(0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.expires_at_ms
    }
}

/// A bet plus its terminal resolution; never mutated after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettledBet {
    #[serde(flatten)]
    pub bet: ActiveBet,
    pub result: BetResult,
    /// "0" on loss, two-decimal `stake * mult` on win
    pub payout: String,
    pub settle_price: f64,
    pub settled_at_ms: i64,
}

/// Parse and range-check a submitted stake against the currency limits.
pub fn validate_stake(amount_text: &str, currency: Currency) -> Result<f64, BetError> {
    let stake: f64 = amount_text
        .trim()
        .parse()
        .map_err(|_| BetError::InvalidAmount)?;
    if !stake.is_finite() || stake <= 0.0 {
        return Err(BetError::InvalidAmount);
    }

    let limits = currency.limits();
    if stake < limits.min {
        return Err(BetError::BelowMinimum {
            min: limits.min,
            currency: currency.as_str(),
        });
    }
    if stake > limits.max {
        return Err(BetError::AboveMaximum {
            max: limits.max,
            currency: currency.as_str(),
        });
    }
    Ok(stake)
}

/// Build a bet against the instrument's current price. The stake must have
/// been validated already; this only guards the live-price requirement.
pub fn build_bet(
    instrument: &Instrument,
    direction: Direction,
    amount_text: &str,
    currency: Currency,
    now: DateTime<Utc>,
) -> Result<ActiveBet, BetError> {
    if !instrument.has_live_price() {
        return Err(BetError::NoLivePrice);
    }

    let placed_at_ms = now.timestamp_millis();
    Ok(ActiveBet {
        instrument_id: instrument.id,
        direction,
        amount: amount_text.trim().to_string(),
        currency,
        placed_at_ms,
        expires_at_ms: placed_at_ms + BET_WINDOW_SECS * 1000,
        entry_price: instrument.price,
    })
}

/// Withdraw a bet inside the grace window. Removes and returns the matching
/// bet; the active set is untouched on any failure.
pub fn cancel_bet(
    active: &mut Vec<ActiveBet>,
    instrument_id: u32,
    placed_at_ms: i64,
    now: DateTime<Utc>,
) -> Result<ActiveBet, BetError> {
    let idx = active
        .iter()
        .position(|b| b.instrument_id == instrument_id && b.placed_at_ms == placed_at_ms)
        .ok_or(BetError::UnknownBet)?;

    if now.timestamp_millis() - placed_at_ms > CANCEL_WINDOW_SECS * 1000 {
        return Err(BetError::TooLateToCancel);
    }

    Ok(active.remove(idx))
}
