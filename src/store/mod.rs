//! Key-value persistence port.
//!
//! The engine persists five independent records (active bets, settled
//! history, streak, reward totals, score history) as plain JSON values.
//! Writes are best-effort: a failed save is logged and never surfaced to the
//! operation that triggered it. A missing key always loads as the default.

pub mod memory;
pub mod sqlite;

pub use self::memory::MemoryStore;
pub use self::sqlite::SqliteStore;

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

pub mod keys {
    pub const ACTIVE_BETS: &str = "bets.active";
    pub const SETTLED_HISTORY: &str = "bets.history";
    pub const STREAK: &str = "streak";
    pub const REWARD_TOTALS: &str = "rewards.totals";
    pub const SCORE_HISTORY: &str = "rewards.history";
}

pub trait StateStore: Send + Sync {
    fn load_raw(&self, key: &str) -> Result<Option<String>>;
    fn save_raw(&self, key: &str, value: &str) -> Result<()>;
}

pub fn load_or_default<T>(store: &dyn StateStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match store.load_raw(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable persisted state");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "failed to load persisted state");
            T::default()
        }
    }
}

pub fn save<T: Serialize>(store: &dyn StateStore, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, error = %e, "failed to encode state for persistence");
            return;
        }
    };
    if let Err(e) = store.save_raw(key, &raw) {
        warn!(key, error = %e, "failed to persist state");
    }
}
