use serde::{Deserialize, Serialize};

use crate::feed::TickerUpdate;

/// A tradable symbol snapshot, mutated in place on every feed tick.
///
/// `price` stays at 0.0 until the first tick arrives; bets against an
/// unticked instrument are rejected upstream. `mult` is the payout
/// multiplier and is always > 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub id: u32,
    pub symbol: String,
    pub pair: String,
    pub price: f64,
    pub change_pct: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub volume: String,
    pub mult: f64,
    /// Static per-symbol profile feeding the synthetic signal
    pub volatility: f64,
    pub deviation: f64,
}

impl Instrument {
    fn new(id: u32, base: &str, mult: f64, volatility: f64, deviation: f64) -> Self {
        Self {
            id,
            symbol: format!("{base}USDT"),
            pair: format!("{base}/USDT"),
            price: 0.0,
            change_pct: 0.0,
            high: 0.0,
            low: 0.0,
            open: 0.0,
            volume: "0".to_string(),
            mult,
            volatility,
            deviation,
        }
    }

    pub fn apply_update(&mut self, update: &TickerUpdate) {
        self.price = update.last_price;
        self.change_pct = update.change_pct;
        self.high = update.high;
        self.low = update.low;
        self.open = update.open;
        self.volume = format_volume(update.quote_volume);
    }

    pub fn has_live_price(&self) -> bool {
        self.price > 0.0
    }
}

/// The fixed instrument set, created once at startup.
pub fn catalog() -> Vec<Instrument> {
    vec![
        Instrument::new(1, "BTC", 1.85, 0.9, 1.2),
        Instrument::new(2, "ETH", 1.90, 1.0, 1.5),
        Instrument::new(3, "SOL", 1.95, 1.3, 2.2),
        Instrument::new(4, "XRP", 1.92, 1.2, 2.0),
        Instrument::new(5, "DOGE", 1.97, 1.5, 2.8),
    ]
}

/// Instrument with the largest absolute 24h move, if any has ticked yet.
pub fn hottest(instruments: &[Instrument]) -> Option<&Instrument> {
    instruments
        .iter()
        .filter(|i| i.has_live_price())
        .max_by(|a, b| {
            a.change_pct
                .abs()
                .partial_cmp(&b.change_pct.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Compact human form of a raw quote volume, e.g. 1234567890.0 -> "1.23B"
pub fn format_volume(quote_volume: f64) -> String {
    let v = quote_volume.abs();
    if v >= 1e9 {
        format!("{:.2}B", quote_volume / 1e9)
    } else if v >= 1e6 {
        format!("{:.2}M", quote_volume / 1e6)
    } else if v >= 1e3 {
        format!("{:.1}K", quote_volume / 1e3)
    } else {
        format!("{quote_volume:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(last: f64, change: f64) -> TickerUpdate {
        TickerUpdate {
            symbol: "BTCUSDT".to_string(),
            last_price: last,
            change_pct: change,
            high: last * 1.02,
            low: last * 0.97,
            open: last * 0.99,
            quote_volume: 1_234_000_000.0,
        }
    }

    #[test]
    fn test_catalog_multipliers_above_one() {
        for inst in catalog() {
            assert!(inst.mult > 1.0, "{} mult must be > 1", inst.symbol);
            assert!(!inst.has_live_price());
        }
    }

    #[test]
    fn test_apply_update_mutates_in_place() {
        let mut inst = catalog().remove(0);
        inst.apply_update(&update(50_000.0, 2.4));
        assert_eq!(inst.price, 50_000.0);
        assert_eq!(inst.change_pct, 2.4);
        assert_eq!(inst.volume, "1.23B");
        assert!(inst.has_live_price());
    }

    #[test]
    fn test_hottest_picks_largest_absolute_move() {
        let mut instruments = catalog();
        instruments[0].apply_update(&update(50_000.0, 1.5));
        instruments[2].apply_update(&update(150.0, -6.2));
        let hot = hottest(&instruments).expect("hottest");
        assert_eq!(hot.symbol, "SOLUSDT");
    }

    #[test]
    fn test_hottest_ignores_unticked_instruments() {
        let instruments = catalog();
        assert!(hottest(&instruments).is_none());
    }

    #[test]
    fn test_format_volume_buckets() {
        assert_eq!(format_volume(1_234_000_000.0), "1.23B");
        assert_eq!(format_volume(56_700_000.0), "56.70M");
        assert_eq!(format_volume(9_500.0), "9.5K");
        assert_eq!(format_volume(420.0), "420");
    }
}
