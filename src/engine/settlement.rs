use chrono::{DateTime, Utc};

use super::ledger::{ActiveBet, SettledBet};
use super::rewards::{self, ScoreEvent, ScoreInput};
use super::EngineState;
use crate::models::{BetResult, Direction};

/// Most-recent-first settled history cap
pub const SETTLED_HISTORY_CAP: usize = 200;

/// Win iff the price moved through the entry in the chosen direction.
/// An unchanged price always settles as a loss.
pub fn resolve_result(direction: Direction, entry_price: f64, settle_price: f64) -> BetResult {
    let won = match direction {
        Direction::Up => settle_price > entry_price,
        Direction::Down => settle_price < entry_price,
    };
    if won {
        BetResult::Win
    } else {
        BetResult::Lose
    }
}

pub fn format_payout(stake: f64, mult: f64, result: BetResult) -> String {
    match result {
        BetResult::Win => format!("{:.2}", stake * mult),
        BetResult::Lose => "0".to_string(),
    }
}

/// Settle every active bet past its expiry.
///
/// A bet whose instrument has no live price (or is missing entirely) settles
/// against its own entry price, which the win rule resolves to a loss; the
/// scan itself never fails and a bad bet never aborts the batch. Returns the
/// settled bets paired with their score events, oldest placement first.
pub fn settle_due_bets(
    state: &mut EngineState,
    now: DateTime<Utc>,
) -> Vec<(SettledBet, ScoreEvent)> {
    let now_ms = now.timestamp_millis();

    let mut due: Vec<ActiveBet> = Vec::new();
    let mut remaining: Vec<ActiveBet> = Vec::with_capacity(state.active.len());
    for bet in std::mem::take(&mut state.active) {
        if bet.is_expired(now) {
            due.push(bet);
        } else {
            remaining.push(bet);
        }
    }
    state.active = remaining;

    if due.is_empty() {
        return Vec::new();
    }
    // Active is newest-first; settle in placement order
    due.reverse();

    let mut settled_out = Vec::with_capacity(due.len());
    for bet in due {
        let instrument = state
            .instruments
            .iter()
            .find(|i| i.id == bet.instrument_id);

        let settle_price = instrument
            .filter(|i| i.has_live_price())
            .map(|i| i.price)
            .unwrap_or(bet.entry_price);
        let mult = instrument.map(|i| i.mult).unwrap_or(1.0);

        let result = resolve_result(bet.direction, bet.entry_price, settle_price);
        let settled = SettledBet {
            payout: format_payout(bet.stake(), mult, result),
            settle_price,
            settled_at_ms: now_ms,
            result,
            bet,
        };

        let event = rewards::score_settlement(
            &mut state.totals,
            &mut state.score_history,
            ScoreInput {
                bet: &settled,
                instrument,
                streak_days: state.streak.streak_days,
                has_premium: state.has_premium,
            },
            now_ms,
        );

        state.history.push_front(settled.clone());
        settled_out.push((settled, event));
    }
    state.history.truncate(SETTLED_HISTORY_CAP);

    settled_out
}
