//! Read-only views assembled for the UI. Nothing here mutates engine state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::instruments::{self, Instrument};
use super::ledger::{ActiveBet, SettledBet};
use super::rewards::{self, RewardTotals, ScoreEvent};
use super::signal::{self, AlphaSignal, RiskTier};
use super::streak::StreakState;
use super::EngineState;
use crate::models::{BetError, Currency};

/// Flat premium bump applied to the preview multiplier
const PREMIUM_MULT_BONUS: f64 = 0.15;

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentView {
    #[serde(flatten)]
    pub instrument: Instrument,
    pub signal: AlphaSignal,
    pub risk: RiskTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveBetView {
    #[serde(flatten)]
    pub bet: ActiveBet,
    pub time_left_secs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewardSummary {
    pub lifetime_points: u64,
    pub weekly_points: u64,
    pub weekly_window_start_ms: i64,
    pub rank: &'static str,
    pub next_tier_at: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub instruments: Vec<InstrumentView>,
    /// Symbol with the largest absolute 24h move, if any has ticked
    pub hottest: Option<String>,
    pub active_bets: Vec<ActiveBetView>,
    pub history: Vec<SettledBet>,
    pub streak: StreakState,
    pub rewards: RewardSummary,
    pub score_history: Vec<ScoreEvent>,
    pub wallet_connected: bool,
    pub has_premium: bool,
}

pub fn instrument_view(instrument: &Instrument) -> InstrumentView {
    InstrumentView {
        signal: signal::compute_signal(instrument),
        risk: signal::risk_tier(Some(instrument)),
        instrument: instrument.clone(),
    }
}

pub fn reward_summary(totals: &RewardTotals) -> RewardSummary {
    RewardSummary {
        lifetime_points: totals.lifetime_points,
        weekly_points: totals.weekly_points,
        weekly_window_start_ms: totals.weekly_window_start_ms,
        rank: rewards::rank_label(totals.lifetime_points),
        next_tier_at: rewards::next_tier_threshold(totals.lifetime_points),
    }
}

/// Potential payout shown next to the stake input, e.g. "200.00 USDT".
/// Premium sessions preview a flat multiplier bump.
pub fn payout_preview(
    instrument: &Instrument,
    amount_text: &str,
    currency: Currency,
    has_premium: bool,
) -> Result<String, BetError> {
    let stake: f64 = amount_text
        .trim()
        .parse()
        .map_err(|_| BetError::InvalidAmount)?;
    if !stake.is_finite() || stake <= 0.0 {
        return Err(BetError::InvalidAmount);
    }

    let mult = if has_premium {
        instrument.mult + PREMIUM_MULT_BONUS
    } else {
        instrument.mult
    };
    Ok(format!("{:.2} {}", stake * mult, currency.as_str()))
}

pub fn snapshot(state: &EngineState, now: DateTime<Utc>) -> Snapshot {
    Snapshot {
        instruments: state.instruments.iter().map(instrument_view).collect(),
        hottest: instruments::hottest(&state.instruments).map(|i| i.symbol.clone()),
        active_bets: state
            .active
            .iter()
            .map(|bet| ActiveBetView {
                time_left_secs: bet.time_left_secs(now),
                bet: bet.clone(),
            })
            .collect(),
        history: state.history.iter().cloned().collect(),
        streak: state.streak.clone(),
        rewards: reward_summary(&state.totals),
        score_history: state.score_history.iter().cloned().collect(),
        wallet_connected: state.wallet_connected,
        has_premium: state.has_premium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::instruments::catalog;
    use crate::feed::TickerUpdate;

    fn live_btc() -> Instrument {
        let mut inst = catalog().remove(0);
        inst.apply_update(&TickerUpdate {
            symbol: inst.symbol.clone(),
            last_price: 50_000.0,
            change_pct: 2.5,
            high: 50_500.0,
            low: 48_000.0,
            open: 48_900.0,
            quote_volume: 3e9,
        });
        inst
    }

    #[test]
    fn test_payout_preview_formats_with_currency_suffix() {
        let inst = live_btc();
        assert_eq!(
            payout_preview(&inst, "100", Currency::Usdt, false),
            Ok("185.00 USDT".to_string())
        );
        assert_eq!(
            payout_preview(&inst, "100", Currency::Usdt, true),
            Ok("200.00 USDT".to_string())
        );
    }

    #[test]
    fn test_payout_preview_rejects_bad_amounts() {
        let inst = live_btc();
        assert_eq!(
            payout_preview(&inst, "nope", Currency::Usdt, false),
            Err(BetError::InvalidAmount)
        );
        assert_eq!(
            payout_preview(&inst, "-1", Currency::Sol, false),
            Err(BetError::InvalidAmount)
        );
    }

    #[test]
    fn test_instrument_view_carries_signal_and_risk() {
        let view = instrument_view(&live_btc());
        assert_eq!(view.risk, RiskTier::Medium);
        assert!(view.signal.probability >= 50.0);
    }

    #[test]
    fn test_reward_summary_rank() {
        let mut totals = RewardTotals::default();
        totals.lifetime_points = 5_100;
        let summary = reward_summary(&totals);
        assert_eq!(summary.rank, "Shark");
        assert_eq!(summary.next_tier_at, Some(15_000));
    }
}
