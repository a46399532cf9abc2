//! Binance 24h ticker stream adapter.
//!
//! Maintains a single WebSocket connection to the combined ticker stream for
//! the configured symbols and republishes normalized `TickerUpdate`s over a
//! broadcast channel. Frames that fail to parse, or that reference a symbol
//! we never subscribed to, are dropped silently; the engine rejects bets on
//! instruments that have not ticked, so a quiet feed degrades safely.

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio::sync::{broadcast, watch};
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::TickerUpdate;

pub struct BinanceTickerFeed {
    update_tx: broadcast::Sender<TickerUpdate>,
    shutdown_tx: watch::Sender<bool>,
}

/// Combined-stream envelope: {"stream":"btcusdt@ticker","data":{...}}
#[derive(Debug, Deserialize)]
struct CombinedFrame {
    stream: String,
    data: TickerFrame,
}

#[derive(Debug, Deserialize)]
struct TickerFrame {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "c")]
    last_price: String,
    #[serde(rename = "P")]
    change_pct: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "q")]
    quote_volume: String,
}

impl BinanceTickerFeed {
    /// Spawn the feed worker and return a handle to subscribe for ticks.
    pub fn spawn(base_url: &str, symbols: &[String]) -> Arc<Self> {
        let (update_tx, _) = broadcast::channel(1024);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let feed = Arc::new(Self {
            update_tx,
            shutdown_tx,
        });

        let url = stream_url(base_url, symbols);
        let worker = feed.clone();
        tokio::spawn(async move {
            if let Err(e) = worker.run(url, shutdown_rx).await {
                warn!(error = %e, "binance ticker feed stopped");
            }
        });

        feed
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TickerUpdate> {
        self.update_tx.subscribe()
    }

    /// Tear the subscription down. The worker exits after the current frame.
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    async fn run(
        self: Arc<Self>,
        url: String,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut reconnect_delay = Duration::from_secs(1);
        let max_reconnect_delay = Duration::from_secs(30);

        loop {
            if *shutdown_rx.borrow() {
                return Ok(());
            }

            match self.connect_and_stream(&url, &mut shutdown_rx).await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    warn!(error = %e, "binance ticker stream disconnected; reconnecting");
                    tokio::select! {
                        _ = sleep(reconnect_delay) => {}
                        _ = shutdown_rx.changed() => return Ok(()),
                    }
                    reconnect_delay = (reconnect_delay * 2).min(max_reconnect_delay);
                }
            }
        }
    }

    async fn connect_and_stream(
        &self,
        url: &str,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        info!("🔌 Connecting to Binance ticker stream");
        let (ws_stream, resp) = connect_async(url)
            .await
            .context("connect_async binance ticker stream")?;
        info!("✅ Binance ticker stream connected (status={})", resp.status());

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                ws_msg = read.next() => {
                    let Some(ws_msg) = ws_msg else {
                        return Err(anyhow::anyhow!("ticker stream ended"));
                    };

                    match ws_msg {
                        Ok(Message::Text(text)) => {
                            if let Some(update) = parse_ticker_frame(&text) {
                                let _ = self.update_tx.send(update);
                            }
                        }
                        Ok(Message::Ping(payload)) => {
                            let _ = write.send(Message::Pong(payload)).await;
                        }
                        Ok(Message::Close(frame)) => {
                            debug!(?frame, "ticker stream close");
                            return Err(anyhow::anyhow!("ticker stream closed by server"));
                        }
                        Ok(_) => {}
                        Err(e) => {
                            return Err(anyhow::anyhow!("ticker stream error: {e}"));
                        }
                    }
                }
            }
        }
    }
}

fn stream_url(base_url: &str, symbols: &[String]) -> String {
    let streams: Vec<String> = symbols
        .iter()
        .map(|s| format!("{}@ticker", s.to_ascii_lowercase()))
        .collect();
    format!("{}/stream?streams={}", base_url, streams.join("/"))
}

/// Decode one combined-stream text frame. Anything that is not a well-formed
/// ticker payload yields None.
fn parse_ticker_frame(text: &str) -> Option<TickerUpdate> {
    let frame: CombinedFrame = serde_json::from_str(text).ok()?;
    if !frame.stream.ends_with("@ticker") {
        return None;
    }

    let data = frame.data;
    let last_price: f64 = data.last_price.parse().ok()?;
    if !last_price.is_finite() || last_price <= 0.0 {
        return None;
    }

    Some(TickerUpdate {
        symbol: data.symbol,
        last_price,
        change_pct: data.change_pct.parse().ok()?,
        high: data.high.parse().ok()?,
        low: data.low.parse().ok()?,
        open: data.open.parse().ok()?,
        quote_volume: data.quote_volume.parse().ok()?,
    })
}
