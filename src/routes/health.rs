use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/ready", get(ready))
}

#[derive(Serialize)]
struct CompatHealthResponse {
    status: &'static str,
    database: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    start_time: String,
    uptime: u64,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessResponse {
    status: &'static str,
    timestamp: String,
    store: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database_latency_ms: Option<u64>,
}

enum DbCheckStatus {
    NotConfigured,
    Connected { latency_ms: u64 },
    Disconnected,
}

impl DbCheckStatus {
    fn label(&self) -> &'static str {
        match self {
            DbCheckStatus::NotConfigured => "not_configured",
            DbCheckStatus::Connected { .. } => "connected",
            DbCheckStatus::Disconnected => "disconnected",
        }
    }
}

async fn root(State(state): State<AppState>) -> Response {
    let db_status = database_check(&state).await;
    let ok = !matches!(db_status, DbCheckStatus::Disconnected);

    let response = CompatHealthResponse {
        status: if ok { "ok" } else { "degraded" },
        database: db_status.label(),
        timestamp: now_iso(),
    };

    let status_code = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        start_time: DateTime::<Utc>::from(state.started_at_system())
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION"),
    })
    .into_response()
}

async fn ready(State(state): State<AppState>) -> Response {
    let db_status = database_check(&state).await;
    let database_latency_ms = match db_status {
        DbCheckStatus::Connected { latency_ms } => Some(latency_ms),
        _ => None,
    };
    let ready = !matches!(db_status, DbCheckStatus::Disconnected);

    let response = ReadinessResponse {
        status: if ready { "healthy" } else { "unhealthy" },
        timestamp: now_iso(),
        store: state.adaptive().store_backend(),
        database: db_status.label(),
        database_latency_ms,
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn database_check(state: &AppState) -> DbCheckStatus {
    let Some(proxy) = state.db_proxy() else {
        return DbCheckStatus::NotConfigured;
    };

    match proxy.ping().await {
        Ok(elapsed) => DbCheckStatus::Connected {
            latency_ms: elapsed.as_millis() as u64,
        },
        Err(err) => {
            tracing::warn!(error = %err, "database health check failed");
            DbCheckStatus::Disconnected
        }
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
