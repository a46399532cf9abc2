pub mod binance;

pub use self::binance::BinanceTickerFeed;

/// Normalized 24h ticker tick for one instrument symbol
#[derive(Debug, Clone)]
pub struct TickerUpdate {
    pub symbol: String,
    pub last_price: f64,
    pub change_pct: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub quote_volume: f64,
}
