//! End-to-end engine scenarios driven with injected timestamps and a fake
//! price feed: placement validation, the cancellation grace window, win/lose
//! settlement, scoring, streaks, and persistence restore.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use alphapulse::engine::ledger::BET_WINDOW_SECS;
use alphapulse::engine::PredictionEngine;
use alphapulse::feed::TickerUpdate;
use alphapulse::models::{BetError, BetResult, Currency, Direction};
use alphapulse::store::{MemoryStore, SqliteStore};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_750_000_000 + secs, 0).unwrap()
}

fn tick(symbol: &str, price: f64, change_pct: f64) -> TickerUpdate {
    TickerUpdate {
        symbol: symbol.to_string(),
        last_price: price,
        change_pct,
        high: price * 1.02,
        low: price * 0.97,
        open: price * 0.99,
        quote_volume: 1.5e9,
    }
}

fn engine_with_live_btc() -> PredictionEngine {
    let engine = PredictionEngine::new(Arc::new(MemoryStore::new()));
    engine.set_session_flags(true, false);
    engine.apply_tick(&tick("BTCUSDT", 50_000.0, 1.2));
    engine
}

#[test]
fn up_bet_wins_at_higher_settlement_price() {
    let engine = engine_with_live_btc();
    engine
        .place_bet(1, Direction::Up, "100", Currency::Usdt, at(0))
        .unwrap();

    engine.apply_tick(&tick("BTCUSDT", 50_500.0, 1.4));
    let notices = engine.scan_and_settle(at(BET_WINDOW_SECS));

    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].bet.result, BetResult::Win);
    assert_eq!(notices[0].bet.payout, "185.00");
    assert_eq!(notices[0].pair, "BTC/USDT");

    let snap = engine.snapshot(at(BET_WINDOW_SECS + 1));
    assert!(snap.active_bets.is_empty());
    assert_eq!(snap.history.len(), 1);
    assert!(snap.rewards.lifetime_points > 0);
}

#[test]
fn down_bet_loses_at_higher_settlement_price() {
    let engine = engine_with_live_btc();
    engine
        .place_bet(1, Direction::Down, "100", Currency::Usdt, at(0))
        .unwrap();

    engine.apply_tick(&tick("BTCUSDT", 50_500.0, 1.4));
    let notices = engine.scan_and_settle(at(BET_WINDOW_SECS));

    assert_eq!(notices[0].bet.result, BetResult::Lose);
    assert_eq!(notices[0].bet.payout, "0");
    // Losers still earn participation points
    let snap = engine.snapshot(at(BET_WINDOW_SECS + 1));
    assert!(snap.rewards.lifetime_points > 0);
}

#[test]
fn below_minimum_stake_is_rejected_without_mutation() {
    let engine = engine_with_live_btc();
    let result = engine.place_bet(1, Direction::Up, "3", Currency::Usdt, at(0));

    assert_eq!(
        result,
        Err(BetError::BelowMinimum {
            min: 5.0,
            currency: "USDT"
        })
    );
    let snap = engine.snapshot(at(1));
    assert!(snap.active_bets.is_empty());
    assert_eq!(snap.streak.streak_days, 0);
}

#[test]
fn placement_against_unticked_instrument_is_rejected() {
    let engine = PredictionEngine::new(Arc::new(MemoryStore::new()));
    engine.set_session_flags(true, false);

    assert_eq!(
        engine.place_bet(1, Direction::Up, "100", Currency::Usdt, at(0)),
        Err(BetError::NoLivePrice)
    );
}

#[test]
fn late_cancel_is_rejected_and_bet_still_settles() {
    let engine = engine_with_live_btc();
    let bet = engine
        .place_bet(1, Direction::Up, "100", Currency::Usdt, at(0))
        .unwrap();

    assert_eq!(
        engine.cancel_bet(1, bet.placed_at_ms, at(25)),
        Err(BetError::TooLateToCancel)
    );
    assert_eq!(engine.snapshot(at(26)).active_bets.len(), 1);

    engine.apply_tick(&tick("BTCUSDT", 50_600.0, 1.5));
    let notices = engine.scan_and_settle(at(BET_WINDOW_SECS));
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].bet.result, BetResult::Win);
}

#[test]
fn timely_cancel_removes_bet_from_both_sets() {
    let engine = engine_with_live_btc();
    let bet = engine
        .place_bet(1, Direction::Up, "100", Currency::Usdt, at(0))
        .unwrap();

    engine.cancel_bet(1, bet.placed_at_ms, at(10)).unwrap();

    let snap = engine.snapshot(at(11));
    assert!(snap.active_bets.is_empty());
    assert!(snap.history.is_empty());

    // Nothing left to settle
    assert!(engine.scan_and_settle(at(BET_WINDOW_SECS + 1)).is_empty());
}

#[test]
fn repeated_scans_settle_each_bet_exactly_once() {
    let engine = engine_with_live_btc();
    engine
        .place_bet(1, Direction::Up, "100", Currency::Usdt, at(0))
        .unwrap();
    engine
        .place_bet(1, Direction::Down, "50", Currency::Usdt, at(5))
        .unwrap();

    engine.apply_tick(&tick("BTCUSDT", 50_500.0, 1.4));
    let first = engine.scan_and_settle(at(BET_WINDOW_SECS + 5));
    let second = engine.scan_and_settle(at(BET_WINDOW_SECS + 6));

    assert_eq!(first.len(), 2);
    assert!(second.is_empty());
    assert_eq!(engine.snapshot(at(400)).history.len(), 2);
}

#[test]
fn premium_preview_bumps_the_multiplier() {
    let engine = engine_with_live_btc();
    assert_eq!(
        engine.payout_preview(1, "100", Currency::Usdt),
        Ok("185.00 USDT".to_string())
    );

    engine.set_session_flags(true, true);
    assert_eq!(
        engine.payout_preview(1, "100", Currency::Usdt),
        Ok("200.00 USDT".to_string())
    );
}

#[test]
fn streak_unlocks_claimable_bonus_after_three_days() {
    let engine = engine_with_live_btc();
    let day = 24 * 60 * 60;

    for d in 0..3 {
        engine
            .place_bet(1, Direction::Up, "10", Currency::Usdt, at(d * day))
            .unwrap();
    }

    let snap = engine.snapshot(at(3 * day));
    assert_eq!(snap.streak.streak_days, 3);
    assert!(snap.streak.bonus_claimable);

    assert_eq!(engine.claim_streak_bonus(), Ok(1));
    assert_eq!(engine.claim_streak_bonus(), Err(BetError::NothingToClaim));
}

#[test]
fn hidden_rating_moves_after_settlement_and_stays_bounded() {
    let engine = engine_with_live_btc();
    let initial = engine.hidden_rating();

    engine
        .place_bet(1, Direction::Up, "100", Currency::Usdt, at(0))
        .unwrap();
    engine.apply_tick(&tick("BTCUSDT", 49_000.0, -2.0));
    engine.scan_and_settle(at(BET_WINDOW_SECS));

    let after_loss = engine.hidden_rating();
    assert!(after_loss < initial);
    assert!((600..=1800).contains(&after_loss));
}

#[test]
fn session_survives_a_restart_via_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alphapulse.db");
    let path = path.to_str().unwrap();

    let lifetime_points = {
        let store = Arc::new(SqliteStore::new(path).unwrap());
        let engine = PredictionEngine::new(store);
        engine.set_session_flags(true, false);
        engine.apply_tick(&tick("BTCUSDT", 50_000.0, 1.2));
        engine
            .place_bet(1, Direction::Up, "100", Currency::Usdt, at(0))
            .unwrap();
        engine.apply_tick(&tick("BTCUSDT", 50_500.0, 1.4));
        engine.scan_and_settle(at(BET_WINDOW_SECS));
        engine.snapshot(at(400)).rewards.lifetime_points
    };
    assert!(lifetime_points > 0);

    let store = Arc::new(SqliteStore::new(path).unwrap());
    let revived = PredictionEngine::new(store);
    let snap = revived.snapshot(at(500));

    assert_eq!(snap.history.len(), 1);
    assert_eq!(snap.history[0].payout, "185.00");
    assert_eq!(snap.rewards.lifetime_points, lifetime_points);
    assert_eq!(snap.streak.streak_days, 1);
}
