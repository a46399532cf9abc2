use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::engine::views::Snapshot;
use crate::engine::PredictionEngine;
use crate::models::{BetError, Currency, Direction};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PredictionEngine>,
}

/// Create the API router
pub fn create_router(engine: Arc<PredictionEngine>) -> Router {
    let state = AppState { engine };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/state", get(get_state))
        .route("/api/instruments", get(get_instruments))
        .route("/api/bets", post(place_bet))
        .route("/api/bets/cancel", post(cancel_bet))
        .route("/api/streak/claim", post(claim_streak_bonus))
        .route("/api/session", post(set_session_flags))
        .route("/api/preview", get(payout_preview))
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Full game-state snapshot for the UI
async fn get_state(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.engine.snapshot(Utc::now()))
}

/// Instrument list with derived signal/risk
async fn get_instruments(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.engine.snapshot(Utc::now());
    Json(json!({
        "hottest": snapshot.hottest,
        "instruments": snapshot.instruments,
    }))
}

async fn place_bet(
    State(state): State<AppState>,
    Json(req): Json<PlaceBetRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bet = state.engine.place_bet(
        req.instrument_id,
        req.direction,
        &req.amount,
        req.currency,
        Utc::now(),
    )?;
    Ok(Json(json!({ "placed": bet })))
}

async fn cancel_bet(
    State(state): State<AppState>,
    Json(req): Json<CancelBetRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .engine
        .cancel_bet(req.instrument_id, req.placed_at_ms, Utc::now())?;
    Ok(Json(json!({ "cancelled": true })))
}

async fn claim_streak_bonus(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claimed_total = state.engine.claim_streak_bonus()?;
    Ok(Json(json!({ "claimed_total": claimed_total })))
}

/// Externally-owned wallet/premium flags pushed in by the UI layer
async fn set_session_flags(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Json<serde_json::Value> {
    state
        .engine
        .set_session_flags(req.wallet_connected, req.has_premium);
    Json(json!({ "ok": true }))
}

async fn payout_preview(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payout = state
        .engine
        .payout_preview(query.instrument_id, &query.amount, query.currency)?;
    Ok(Json(json!({ "payout": payout })))
}

/// Push settlement results to connected clients as they happen
async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut rx = state.engine.subscribe_notices();

    loop {
        tokio::select! {
            notice = rx.recv() => {
                let Ok(notice) = notice else {
                    break;
                };
                let msg = serde_json::to_string(&notice).unwrap_or_else(|e| {
                    warn!("failed to serialize settlement notice: {}", e);
                    "{}".to_string()
                });
                if socket.send(Message::Text(msg)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) if text == "ping" => {
                        let _ = socket.send(Message::Text("pong".to_string())).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }
}

// ===== Request/Response Types =====

#[derive(Debug, Deserialize)]
struct PlaceBetRequest {
    instrument_id: u32,
    direction: Direction,
    amount: String,
    currency: Currency,
}

#[derive(Debug, Deserialize)]
struct CancelBetRequest {
    instrument_id: u32,
    placed_at_ms: i64,
}

#[derive(Debug, Deserialize)]
struct SessionRequest {
    wallet_connected: bool,
    has_premium: bool,
}

#[derive(Debug, Deserialize)]
struct PreviewQuery {
    instrument_id: u32,
    amount: String,
    currency: Currency,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

// ===== Error Handling =====

#[derive(Debug)]
enum ApiError {
    Rejected(BetError),
    Internal(anyhow::Error),
}

impl From<BetError> for ApiError {
    fn from(err: BetError) -> Self {
        ApiError::Rejected(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Rejected(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Internal(err) => {
                tracing::error!("internal error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
