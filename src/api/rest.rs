// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Reads come straight from `AppState`;
// writes go through the same `AppState` / engine operations the refresh cycle
// uses, so the API can never put the state somewhere a cycle couldn't.
//
// Invalid input answers 400 with `{ "error": "..." }` and changes nothing.
// CORS is configured permissively for the local dashboard.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::app_state::AppState;
use crate::engine;
use crate::market_data::PriceSample;
use crate::types::AppMode;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn bad_request(message: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message.to_string() })),
    )
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Reads ───────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/signal", get(signal))
        .route("/api/v1/overview", get(overview))
        .route("/api/v1/history", get(history))
        .route("/api/v1/orderbook", get(orderbook))
        // ── User data ───────────────────────────────────────────────
        .route("/api/v1/alerts", get(list_alerts).post(add_alert))
        .route("/api/v1/alerts/:id", delete(remove_alert))
        .route("/api/v1/position", post(set_position))
        // ── Control ─────────────────────────────────────────────────
        .route("/api/v1/control/pair", post(control_pair))
        .route("/api/v1/control/timeframe", post(control_timeframe))
        .route("/api/v1/control/mode", post(control_mode))
        .route("/api/v1/control/notifications", post(control_notifications))
        .route("/api/v1/refresh", post(manual_refresh))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    source: &'static str,
    cycle_running: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        source: state.source.name(),
        cycle_running: state.busy.is_busy(),
    })
}

// =============================================================================
// Snapshots
// =============================================================================

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

/// The single-pair view: price, signal (or collecting progress) and P&L.
async fn signal(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.build_snapshot();
    Json(serde_json::json!({
        "pair": snapshot.active_pair,
        "timeframe": snapshot.timeframe,
        "evaluation": snapshot.evaluation,
        "view": snapshot.pair,
    }))
}

async fn overview(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.overview_report.read().clone();
    Json(serde_json::json!({ "report": report }))
}

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct HistoryResponse {
    pair: String,
    len: usize,
    /// Newest first.
    samples: Vec<PriceSample>,
}

async fn history(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    let session = state.session.read();
    let series = session.series();
    let limit = q.limit.unwrap_or(series.capacity());
    Json(HistoryResponse {
        pair: series.pair().to_string(),
        len: series.len(),
        samples: series.recent(limit),
    })
}

async fn orderbook(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let book = state.order_book.read().clone();
    Json(serde_json::json!({ "order_book": book }))
}

// =============================================================================
// Alerts & position
// =============================================================================

async fn list_alerts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.alerts.read().alerts().to_vec())
}

#[derive(Deserialize)]
struct AlertRequest {
    /// Raw user text, validated the same way as the input box.
    price: String,
}

async fn add_alert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AlertRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let alert = state.add_alert(&req.price).map_err(bad_request)?;
    Ok((StatusCode::CREATED, Json(alert)))
}

async fn remove_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if state.remove_alert(id) {
        Ok(Json(serde_json::json!({ "removed": id })))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("no alert with id {id}") })),
        ))
    }
}

#[derive(Deserialize)]
struct PositionRequest {
    #[serde(default)]
    entry_price: String,
    #[serde(default)]
    quantity: String,
}

async fn set_position(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PositionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pnl = state
        .set_position(&req.entry_price, &req.quantity)
        .map_err(bad_request)?;
    let position = state.session.read().position;
    Ok(Json(serde_json::json!({ "position": position, "pnl": pnl })))
}

// =============================================================================
// Control endpoints
// =============================================================================

#[derive(Deserialize)]
struct PairRequest {
    pair: String,
}

async fn control_pair(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PairRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.select_pair(&req.pair).map_err(bad_request)?;
    let pair = state.session.read().pair().to_string();
    Ok(Json(serde_json::json!({ "pair": pair })))
}

#[derive(Deserialize)]
struct TimeframeRequest {
    timeframe: String,
}

async fn control_timeframe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TimeframeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.select_timeframe(&req.timeframe).map_err(bad_request)?;
    let timeframe = state.session.read().timeframe().to_string();
    Ok(Json(serde_json::json!({ "timeframe": timeframe })))
}

#[derive(Deserialize)]
struct ModeRequest {
    mode: String,
}

async fn control_mode(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ModeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mode: AppMode = req.mode.parse().map_err(bad_request)?;
    engine::switch_mode(&state, mode);
    info!(mode = %mode, "mode changed via API");
    Ok(Json(serde_json::json!({ "mode": mode })))
}

#[derive(Deserialize)]
struct NotificationsRequest {
    enabled: bool,
}

async fn control_notifications(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NotificationsRequest>,
) -> impl IntoResponse {
    state.set_notifications(req.enabled);
    Json(serde_json::json!({ "notifications_enabled": req.enabled }))
}

async fn manual_refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let outcome = engine::refresh(&state).await;
    info!(outcome = ?outcome, "manual refresh");
    Json(serde_json::json!({
        "outcome": outcome,
        "state_version": state.current_state_version(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::test_support::{scripted, state_with};
    use crate::runtime_config::RuntimeConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<AppState>) {
        let config = RuntimeConfig {
            mode: AppMode::DayTrading,
            ..RuntimeConfig::default()
        };
        let (state, _, _) = state_with(config, scripted(&[100.0, 101.0, 102.0]));
        (router(state.clone()), state)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_and_state() {
        let (app, _) = app();
        let (status, body) = call(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cycle_running"], false);

        let (status, body) = call(&app, "GET", "/api/v1/state", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "day_trading");
        assert_eq!(body["active_pair"], "btc_jpy");
        assert!(body["last_signal"].is_null());
    }

    #[tokio::test]
    async fn refresh_then_history_newest_first() {
        let (app, _) = app();
        for _ in 0..3 {
            let (status, body) = call(&app, "POST", "/api/v1/refresh", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["outcome"], "completed");
        }

        let (_, body) = call(&app, "GET", "/api/v1/history?limit=2", None).await;
        assert_eq!(body["len"], 3);
        let samples = body["samples"].as_array().unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0]["price"], 102.0);

        let (_, body) = call(&app, "GET", "/api/v1/signal", None).await;
        assert_eq!(body["evaluation"]["state"], "collecting");
        assert_eq!(body["evaluation"]["need"], 20);

        let (_, body) = call(&app, "GET", "/api/v1/orderbook", None).await;
        assert_eq!(body["order_book"]["best_ask"], 101.0);
    }

    #[tokio::test]
    async fn invalid_input_is_400_and_changes_nothing() {
        let (app, state) = app();

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/control/pair",
            Some(serde_json::json!({ "pair": "doge_usd" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("doge_usd"));
        assert_eq!(state.session.read().pair(), "btc_jpy");

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/position",
            Some(serde_json::json!({ "entry_price": "abc", "quantity": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/control/mode",
            Some(serde_json::json!({ "mode": "scalping" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.mode(), AppMode::DayTrading);

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/alerts",
            Some(serde_json::json!({ "price": "0" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.alerts.read().is_empty());
    }

    #[tokio::test]
    async fn alert_lifecycle() {
        let (app, _) = app();
        let (status, alert) = call(
            &app,
            "POST",
            "/api/v1/alerts",
            Some(serde_json::json!({ "price": "101" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(alert["pair"], "btc_jpy");
        assert_eq!(alert["triggered"], false);

        let (_, list) = call(&app, "GET", "/api/v1/alerts", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let id = alert["id"].as_i64().unwrap();
        let uri = format!("/api/v1/alerts/{id}");
        let (status, _) = call(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn position_reports_pnl_after_a_price() {
        let (app, _) = app();
        call(&app, "POST", "/api/v1/refresh", None).await;
        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/position",
            Some(serde_json::json!({ "entry_price": "90", "quantity": "2" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pnl"]["pnl"], 20.0);
    }

    #[tokio::test]
    async fn mode_and_notification_controls() {
        let (app, state) = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/control/mode",
            Some(serde_json::json!({ "mode": "overview" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "overview");
        assert_eq!(state.mode(), AppMode::Overview);
        state.scheduler.stop();

        let (_, body) = call(
            &app,
            "POST",
            "/api/v1/control/notifications",
            Some(serde_json::json!({ "enabled": true })),
        )
        .await;
        assert_eq!(body["notifications_enabled"], true);
        assert!(state.notifications_enabled());

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/control/timeframe",
            Some(serde_json::json!({ "timeframe": "1h" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timeframe"], "1h");
    }
}
