//! The prediction engine: a session-scoped container owning every piece of
//! mutable game state behind one lock.
//!
//! All operations take an injected `now` so the settlement scan and the
//! streak/rolling-window math are testable without wall-clock timers; the
//! runtime loop in `main.rs` is just `interval(1s)` around `scan_and_settle`.
//! Persistence is best-effort after each mutation and never blocks or fails
//! an operation.

pub mod instruments;
pub mod ledger;
pub mod rewards;
pub mod settlement;
pub mod signal;
pub mod streak;
pub mod views;

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::feed::TickerUpdate;
use crate::models::{BetError, Currency, Direction};
use crate::store::{self, keys, StateStore};
use self::instruments::Instrument;
use self::ledger::{ActiveBet, SettledBet};
use self::rewards::{RewardTotals, ScoreEvent};
use self::streak::StreakState;
use self::views::Snapshot;

/// Published once per settled bet for UI consumption
#[derive(Debug, Clone, Serialize)]
pub struct SettlementNotice {
    pub pair: String,
    pub points: u32,
    #[serde(flatten)]
    pub bet: SettledBet,
}

pub struct EngineState {
    pub instruments: Vec<Instrument>,
    /// Newest-first open bets
    pub active: Vec<ActiveBet>,
    /// Most-recent-first settled bets, capped
    pub history: VecDeque<SettledBet>,
    pub streak: StreakState,
    pub totals: RewardTotals,
    pub score_history: VecDeque<ScoreEvent>,
    pub wallet_connected: bool,
    pub has_premium: bool,
}

impl EngineState {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self {
            instruments,
            active: Vec::new(),
            history: VecDeque::new(),
            streak: StreakState::default(),
            totals: RewardTotals::default(),
            score_history: VecDeque::new(),
            wallet_connected: false,
            has_premium: false,
        }
    }
}

pub struct PredictionEngine {
    state: Mutex<EngineState>,
    store: Arc<dyn StateStore>,
    notice_tx: broadcast::Sender<SettlementNotice>,
}

impl PredictionEngine {
    /// Build the engine, restoring any previously persisted session state.
    /// A missing or empty store yields a fresh default session.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let mut state = EngineState::new(instruments::catalog());
        state.active = store::load_or_default(store.as_ref(), keys::ACTIVE_BETS);
        state.history = store::load_or_default(store.as_ref(), keys::SETTLED_HISTORY);
        state.streak = store::load_or_default(store.as_ref(), keys::STREAK);
        state.totals = store::load_or_default(store.as_ref(), keys::REWARD_TOTALS);
        state.score_history = store::load_or_default(store.as_ref(), keys::SCORE_HISTORY);

        let (notice_tx, _) = broadcast::channel(256);
        Self {
            state: Mutex::new(state),
            store,
            notice_tx,
        }
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<SettlementNotice> {
        self.notice_tx.subscribe()
    }

    /// Externally-owned session flags pushed in by the UI layer.
    pub fn set_session_flags(&self, wallet_connected: bool, has_premium: bool) {
        let mut state = self.state.lock();
        state.wallet_connected = wallet_connected;
        state.has_premium = has_premium;
    }

    /// Fold one normalized feed tick into the instrument set. Ticks for
    /// unknown symbols are dropped without a trace.
    pub fn apply_tick(&self, update: &TickerUpdate) {
        let mut state = self.state.lock();
        if let Some(instrument) = state
            .instruments
            .iter_mut()
            .find(|i| i.symbol == update.symbol)
        {
            instrument.apply_update(update);
        }
    }

    pub fn place_bet(
        &self,
        instrument_id: u32,
        direction: Direction,
        amount_text: &str,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Result<ActiveBet, BetError> {
        let mut state = self.state.lock();
        if !state.wallet_connected {
            return Err(BetError::NotConnected);
        }
        ledger::validate_stake(amount_text, currency)?;

        let bet = {
            let instrument = state
                .instruments
                .iter()
                .find(|i| i.id == instrument_id)
                .ok_or(BetError::UnknownInstrument)?;
            ledger::build_bet(instrument, direction, amount_text, currency, now)?
        };

        state.active.insert(0, bet.clone());
        state.streak.record_activity(now.date_naive());

        self.persist_active(&state);
        self.persist_streak(&state);
        Ok(bet)
    }

    pub fn cancel_bet(
        &self,
        instrument_id: u32,
        placed_at_ms: i64,
        now: DateTime<Utc>,
    ) -> Result<(), BetError> {
        let mut state = self.state.lock();
        ledger::cancel_bet(&mut state.active, instrument_id, placed_at_ms, now)?;
        self.persist_active(&state);
        Ok(())
    }

    pub fn claim_streak_bonus(&self) -> Result<u32, BetError> {
        let mut state = self.state.lock();
        let claimed = state.streak.claim()?;
        self.persist_streak(&state);
        Ok(claimed)
    }

    /// Settle everything past expiry and publish one notice per settled bet.
    pub fn scan_and_settle(&self, now: DateTime<Utc>) -> Vec<SettlementNotice> {
        let mut state = self.state.lock();
        let settled = settlement::settle_due_bets(&mut state, now);
        if settled.is_empty() {
            return Vec::new();
        }

        self.persist_active(&state);
        self.persist_rewards(&state);

        let notices: Vec<SettlementNotice> = settled
            .into_iter()
            .map(|(bet, event)| SettlementNotice {
                pair: state
                    .instruments
                    .iter()
                    .find(|i| i.id == bet.bet.instrument_id)
                    .map(|i| i.pair.clone())
                    .unwrap_or_else(|| format!("#{}", bet.bet.instrument_id)),
                points: event.points,
                bet,
            })
            .collect();
        drop(state);

        for notice in &notices {
            let _ = self.notice_tx.send(notice.clone());
        }
        notices
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        views::snapshot(&self.state.lock(), now)
    }

    pub fn payout_preview(
        &self,
        instrument_id: u32,
        amount_text: &str,
        currency: Currency,
    ) -> Result<String, BetError> {
        let state = self.state.lock();
        let instrument = state
            .instruments
            .iter()
            .find(|i| i.id == instrument_id)
            .ok_or(BetError::UnknownInstrument)?;
        views::payout_preview(instrument, amount_text, currency, state.has_premium)
    }

    /// The bounded skill rating. Not part of the public snapshot.
    pub fn hidden_rating(&self) -> i32 {
        self.state.lock().totals.rating
    }

    fn persist_active(&self, state: &EngineState) {
        store::save(self.store.as_ref(), keys::ACTIVE_BETS, &state.active);
        store::save(self.store.as_ref(), keys::SETTLED_HISTORY, &state.history);
    }

    fn persist_streak(&self, state: &EngineState) {
        store::save(self.store.as_ref(), keys::STREAK, &state.streak);
    }

    fn persist_rewards(&self, state: &EngineState) {
        store::save(self.store.as_ref(), keys::REWARD_TOTALS, &state.totals);
        store::save(self.store.as_ref(), keys::SCORE_HISTORY, &state.score_history);
    }
}
