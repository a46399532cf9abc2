//! AlphaPulse - price prediction mini-game backend
//!
//! Wires the Binance ticker feed into the prediction engine, runs the
//! 1-second settlement scan, and serves the UI-facing API.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alphapulse::{
    api, engine::instruments, engine::PredictionEngine, feed::BinanceTickerFeed, models::Config,
    store::SqliteStore,
};

const SETTLE_SCAN_SECS: u64 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alphapulse=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(db = %config.database_path, port = config.port, "starting alphapulse");

    let store = Arc::new(SqliteStore::new(&config.database_path)?);
    let engine = Arc::new(PredictionEngine::new(store));

    if config.feed_enabled {
        let symbols: Vec<String> = instruments::catalog()
            .iter()
            .map(|i| i.symbol.clone())
            .collect();
        let feed = BinanceTickerFeed::spawn(&config.binance_ws_url, &symbols);

        let mut ticks = feed.subscribe();
        let tick_engine = engine.clone();
        tokio::spawn(async move {
            loop {
                match ticks.recv().await {
                    Ok(update) => tick_engine.apply_tick(&update),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "tick consumer lagged")
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    } else {
        warn!("price feed disabled; instruments will not update");
    }

    tokio::spawn(settlement_loop(engine.clone()));

    let app = api::create_router(engine)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .context("bind api listener")?;
    info!("🚀 API listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await.context("serve api")?;

    Ok(())
}

/// Fixed-cadence settlement scan. Each pass settles every expired bet; the
/// engine guarantees a pass never fails, so the loop has nothing to recover.
async fn settlement_loop(engine: Arc<PredictionEngine>) {
    let mut tick = interval(Duration::from_secs(SETTLE_SCAN_SECS));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        for notice in engine.scan_and_settle(Utc::now()) {
            info!(
                pair = %notice.pair,
                result = ?notice.bet.result,
                payout = %notice.bet.payout,
                points = notice.points,
                "📊 prediction settled"
            );
        }
    }
}
