use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::BetError;

/// Consecutive active days required before the bonus unlocks
pub const CLAIMABLE_STREAK: u32 = 3;

/// Daily engagement tracker, persisted across sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakState {
    pub last_active_day: Option<NaiveDate>,
    pub streak_days: u32,
    pub bets_today: u32,
    /// Sticky once the streak reaches the threshold, cleared only by claim
    pub bonus_claimable: bool,
    pub bonuses_claimed: u32,
}

impl StreakState {
    /// Called once per successful bet placement.
    pub fn record_activity(&mut self, today: NaiveDate) {
        match self.last_active_day {
            Some(day) if day == today => {
                self.bets_today += 1;
            }
            Some(day) if today.signed_duration_since(day).num_days() == 1 => {
                self.streak_days += 1;
                self.bets_today = 1;
            }
            // First ever bet, or a gap of 2+ days
            _ => {
                self.streak_days = 1;
                self.bets_today = 1;
            }
        }
        self.last_active_day = Some(today);

        if self.streak_days >= CLAIMABLE_STREAK {
            self.bonus_claimable = true;
        }
    }

    pub fn claim(&mut self) -> Result<u32, BetError> {
        if !self.bonus_claimable {
            return Err(BetError::NothingToClaim);
        }
        self.bonus_claimable = false;
        self.bonuses_claimed += 1;
        Ok(self.bonuses_claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    #[test]
    fn test_first_ever_bet() {
        let mut streak = StreakState::default();
        streak.record_activity(day(1));
        assert_eq!(streak.streak_days, 1);
        assert_eq!(streak.bets_today, 1);
        assert!(!streak.bonus_claimable);
    }

    #[test]
    fn test_same_day_only_bumps_todays_count() {
        let mut streak = StreakState::default();
        streak.record_activity(day(1));
        streak.record_activity(day(1));
        assert_eq!(streak.streak_days, 1);
        assert_eq!(streak.bets_today, 2);
    }

    #[test]
    fn test_consecutive_days_grow_streak() {
        let mut streak = StreakState::default();
        streak.record_activity(day(1));
        streak.record_activity(day(2));
        streak.record_activity(day(3));
        assert_eq!(streak.streak_days, 3);
        assert_eq!(streak.bets_today, 1);
        assert!(streak.bonus_claimable);
    }

    #[test]
    fn test_gap_resets_streak() {
        let mut streak = StreakState::default();
        streak.record_activity(day(1));
        streak.record_activity(day(2));
        streak.record_activity(day(5));
        assert_eq!(streak.streak_days, 1);
        assert_eq!(streak.bets_today, 1);
    }

    #[test]
    fn test_claimable_is_sticky_across_reset() {
        let mut streak = StreakState::default();
        streak.record_activity(day(1));
        streak.record_activity(day(2));
        streak.record_activity(day(3));
        assert!(streak.bonus_claimable);

        // Streak broken before claiming; the earned bonus survives
        streak.record_activity(day(10));
        assert_eq!(streak.streak_days, 1);
        assert!(streak.bonus_claimable);

        assert_eq!(streak.claim(), Ok(1));
        assert!(!streak.bonus_claimable);
    }

    #[test]
    fn test_claim_without_bonus_is_rejected() {
        let mut streak = StreakState::default();
        assert_eq!(streak.claim(), Err(BetError::NothingToClaim));
        streak.record_activity(day(1));
        assert_eq!(streak.claim(), Err(BetError::NothingToClaim));
        assert_eq!(streak.bonuses_claimed, 0);
    }
}
