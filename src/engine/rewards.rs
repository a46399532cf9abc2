//! Alpha Points scoring and the hidden skill rating.
//!
//! Every settlement produces exactly one score event. Points compound a base
//! of 10 through result/risk/streak/size/premium/AI multipliers; the full
//! breakdown is stored verbatim on the event so totals can be audited after
//! the fact. The rating moves by an Elo-style update against the synthetic
//! signal's expectation and is clamped to a fixed band.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::instruments::Instrument;
use super::ledger::SettledBet;
use super::signal::{self, RiskTier};
use crate::models::BetResult;

pub const BASE_POINTS: f64 = 10.0;
pub const SCORE_HISTORY_CAP: usize = 100;
pub const ROLLING_WINDOW_MS: i64 = 7 * 24 * 60 * 60 * 1000;

pub const RATING_FLOOR: i32 = 600;
pub const RATING_CEIL: i32 = 1800;
pub const INITIAL_RATING: i32 = 1000;

/// The multipliers that produced a score, stored exactly as applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierBreakdown {
    pub result: f64,
    pub risk: f64,
    pub streak: f64,
    pub size: f64,
    pub premium: f64,
    pub ai: f64,
}

impl MultiplierBreakdown {
    pub fn product(&self) -> f64 {
        self.result * self.risk * self.streak * self.size * self.premium * self.ai
    }
}

/// One settlement's scoring record, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub id: String,
    pub instrument_id: u32,
    pub placed_at_ms: i64,
    pub settled_at_ms: i64,
    pub result: BetResult,
    pub points: u32,
    pub expected: f64,
    pub risk: RiskTier,
    pub breakdown: MultiplierBreakdown,
}

/// Cumulative scoring state, persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTotals {
    pub lifetime_points: u64,
    pub weekly_points: u64,
    /// 0 until the first scored settlement opens the window
    pub weekly_window_start_ms: i64,
    pub rating: i32,
}

impl Default for RewardTotals {
    fn default() -> Self {
        Self {
            lifetime_points: 0,
            weekly_points: 0,
            weekly_window_start_ms: 0,
            rating: INITIAL_RATING,
        }
    }
}

pub struct ScoreInput<'a> {
    pub bet: &'a SettledBet,
    pub instrument: Option<&'a Instrument>,
    pub streak_days: u32,
    pub has_premium: bool,
}

/// Score one settlement: updates totals, rating, and the capped history.
pub fn score_settlement(
    totals: &mut RewardTotals,
    history: &mut VecDeque<ScoreEvent>,
    input: ScoreInput<'_>,
    now_ms: i64,
) -> ScoreEvent {
    let won = input.bet.result == BetResult::Win;
    let risk = signal::risk_tier(input.instrument);

    let expected = match input.instrument {
        Some(instrument) => {
            let sig = signal::compute_signal(instrument);
            signal::expected_outcome(input.bet.bet.direction, &sig)
        }
        None => 0.5,
    };

    let breakdown = MultiplierBreakdown {
        result: if won { 1.0 } else { 0.25 },
        risk: risk_multiplier(risk),
        streak: streak_multiplier(input.streak_days),
        size: size_multiplier(input.bet.bet.stake()),
        premium: if input.has_premium { 1.25 } else { 1.0 },
        ai: if won {
            1.0 + (1.0 - expected).clamp(0.0, 0.5)
        } else {
            1.0
        },
    };

    let points = (BASE_POINTS * breakdown.product()).round().max(0.0) as u32;

    totals.lifetime_points += points as u64;
    roll_weekly_window(totals, now_ms);
    totals.weekly_points += points as u64;

    let k = 24.0 * rating_k_scale(risk);
    let actual = if won { 1.0 } else { 0.0 };
    let next = totals.rating as f64 + k * (actual - expected);
    totals.rating = (next.round() as i32).clamp(RATING_FLOOR, RATING_CEIL);

    let event = ScoreEvent {
        id: Uuid::new_v4().to_string(),
        instrument_id: input.bet.bet.instrument_id,
        placed_at_ms: input.bet.bet.placed_at_ms,
        settled_at_ms: now_ms,
        result: input.bet.result,
        points,
        expected,
        risk,
        breakdown,
    };

    history.push_front(event.clone());
    history.truncate(SCORE_HISTORY_CAP);

    event
}

fn roll_weekly_window(totals: &mut RewardTotals, now_ms: i64) {
    if totals.weekly_window_start_ms == 0 {
        totals.weekly_window_start_ms = now_ms;
        return;
    }
    if now_ms - totals.weekly_window_start_ms > ROLLING_WINDOW_MS {
        totals.weekly_points = 0;
        totals.weekly_window_start_ms = now_ms;
    }
}

fn risk_multiplier(risk: RiskTier) -> f64 {
    match risk {
        RiskTier::Low => 1.0,
        RiskTier::Medium => 1.3,
        RiskTier::High => 1.6,
        RiskTier::Unknown => 1.0,
    }
}

fn rating_k_scale(risk: RiskTier) -> f64 {
    match risk {
        RiskTier::High => 1.15,
        RiskTier::Medium => 1.0,
        RiskTier::Low => 0.9,
        RiskTier::Unknown => 1.0,
    }
}

fn streak_multiplier(streak_days: u32) -> f64 {
    if streak_days >= 7 {
        2.0
    } else if streak_days >= 5 {
        1.5
    } else if streak_days >= 3 {
        1.2
    } else {
        1.0
    }
}

fn size_multiplier(stake: f64) -> f64 {
    if stake < 20.0 {
        0.8
    } else if stake < 100.0 {
        1.0
    } else if stake < 500.0 {
        1.3
    } else {
        1.6
    }
}

/// Five monotonic tiers over lifetime points.
pub fn rank_label(lifetime_points: u64) -> &'static str {
    if lifetime_points >= 15_000 {
        "Legend"
    } else if lifetime_points >= 5_000 {
        "Shark"
    } else if lifetime_points >= 1_500 {
        "Strategist"
    } else if lifetime_points >= 500 {
        "Trader"
    } else {
        "Scout"
    }
}

/// Points boundary of the next tier, None at the top.
pub fn next_tier_threshold(lifetime_points: u64) -> Option<u64> {
    [500, 1_500, 5_000, 15_000]
        .into_iter()
        .find(|&t| lifetime_points < t)
}
