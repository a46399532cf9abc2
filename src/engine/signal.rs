//! Synthetic directional signal and risk classification.
//!
//! The signal is a deterministic function of an instrument's 24h change and
//! its static volatility/deviation profile. It carries no predictive power;
//! it exists to drive the expectation term of the scoring formulas, so its
//! exact shape is load-bearing for point totals and the hidden rating.

use serde::{Deserialize, Serialize};

use super::instruments::Instrument;
use crate::models::Direction;

const PROBABILITY_FLOOR: f64 = 50.0;
const PROBABILITY_CEIL: f64 = 92.0;
const HIGH_CONFIDENCE_MIN: f64 = 78.0;
const MEDIUM_CONFIDENCE_MIN: f64 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalTier {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::Unknown => "unknown",
        }
    }
}

/// Directional call derived from an instrument's recent move
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlphaSignal {
    pub direction: Direction,
    /// Percent chance the signal direction is "right", clamped to 50..92
    pub probability: f64,
    pub tier: SignalTier,
}

pub fn compute_signal(instrument: &Instrument) -> AlphaSignal {
    let direction = if instrument.change_pct >= 0.0 {
        Direction::Up
    } else {
        Direction::Down
    };

    let magnitude = instrument.change_pct.abs();
    let raw = 55.0 + magnitude * 4.0 * instrument.volatility - instrument.deviation;
    let probability = raw.clamp(PROBABILITY_FLOOR, PROBABILITY_CEIL);

    let tier = if probability >= HIGH_CONFIDENCE_MIN {
        SignalTier::High
    } else if probability >= MEDIUM_CONFIDENCE_MIN {
        SignalTier::Medium
    } else {
        SignalTier::Low
    };

    AlphaSignal {
        direction,
        probability,
        tier,
    }
}

/// Risk classification from the instrument's absolute 24h change.
/// `None` (instrument missing at settlement) classifies as Unknown.
pub fn risk_tier(instrument: Option<&Instrument>) -> RiskTier {
    let Some(instrument) = instrument else {
        return RiskTier::Unknown;
    };
    let magnitude = instrument.change_pct.abs();
    if magnitude < 2.0 {
        RiskTier::Low
    } else if magnitude < 5.0 {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

/// Probability (0..1) that the user's chosen direction is correct, given the
/// signal: the signal probability when aligned with it, its complement when
/// betting against it.
pub fn expected_outcome(direction: Direction, signal: &AlphaSignal) -> f64 {
    let p = signal.probability / 100.0;
    let expected = if direction == signal.direction { p } else { 1.0 - p };
    expected.clamp(0.01, 0.99)
}
