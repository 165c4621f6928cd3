//! Route table.
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | `GET` | `/test` | `Ping` |
//! | `GET` | `/settings` | `ListSettings` |
//! | `GET` | `/settings/:name` | `ReadSetting` |
//! | `PUT` | `/settings/:name/:value` | `WriteSetting` |
//! | `PUT` | `/settings/:name/bounds/:min/:max` | `AdjustBounds` |
//! | `GET` | `/profile` | `ReadProfile` |
//! | `GET` | `/diagnostics/:check` | `RunDiagnostic` |
//! | `POST` | `/diagnostics/:check/apply` | `ApplyCorrection` |
//!
//! Unknown paths are answered 404 and known paths with the wrong method 405
//! by axum itself.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::routing::{get, post, put};
use axum::Router;
use smartpot_gateway::Gateway;
use smartpot_types::{CheckId, Operation};
use tokio::sync::Semaphore;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::response::{ApiError, ApiReply, SERVER_NAME};

/// Upper limit on concurrently handled requests.
pub const MAX_WORKERS: usize = 1024;

#[derive(Clone)]
pub struct AppState {
    gateway: Arc<Gateway>,
    workers: Arc<Semaphore>,
}

impl AppState {
    /// `workers` is clamped to `1..=MAX_WORKERS`.
    pub fn new(gateway: Arc<Gateway>, workers: usize) -> Self {
        Self {
            gateway,
            workers: Arc::new(Semaphore::new(workers.clamp(1, MAX_WORKERS))),
        }
    }

    /// Run one operation while holding a worker permit.  The reply is owned
    /// before the response is rendered.
    async fn execute(&self, op: Operation) -> Result<ApiReply, ApiError> {
        let _permit = self.workers.acquire().await.map_err(|_| ApiError::Unavailable)?;
        Ok(ApiReply(self.gateway.execute(op)))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/test", get(ping))
        .route("/settings", get(list_settings))
        .route("/settings/:name", get(read_setting))
        .route("/settings/:name/:value", put(write_setting))
        .route("/settings/:name/bounds/:min/:max", put(adjust_bounds))
        .route("/profile", get(read_profile))
        .route("/diagnostics/:check", get(run_diagnostic))
        .route("/diagnostics/:check/apply", post(apply_correction))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::SERVER,
            HeaderValue::from_static(SERVER_NAME),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

async fn ping(State(state): State<AppState>) -> Result<ApiReply, ApiError> {
    state.execute(Operation::Ping).await
}

async fn list_settings(State(state): State<AppState>) -> Result<ApiReply, ApiError> {
    state.execute(Operation::ListSettings).await
}

async fn read_setting(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<ApiReply, ApiError> {
    state.execute(Operation::ReadSetting { name }).await
}

async fn write_setting(
    State(state): State<AppState>,
    Path((name, raw)): Path<(String, String)>,
) -> Result<ApiReply, ApiError> {
    state.execute(Operation::WriteSetting { name, raw }).await
}

async fn adjust_bounds(
    State(state): State<AppState>,
    Path((name, min, max)): Path<(String, String, String)>,
) -> Result<ApiReply, ApiError> {
    let min = parse_bound(&min)?;
    let max = parse_bound(&max)?;
    state.execute(Operation::AdjustBounds { name, min, max }).await
}

async fn read_profile(State(state): State<AppState>) -> Result<ApiReply, ApiError> {
    state.execute(Operation::ReadProfile).await
}

async fn run_diagnostic(
    State(state): State<AppState>,
    Path(check): Path<String>,
) -> Result<ApiReply, ApiError> {
    let check = parse_check(&check)?;
    state.execute(Operation::RunDiagnostic { check }).await
}

async fn apply_correction(
    State(state): State<AppState>,
    Path(check): Path<String>,
) -> Result<ApiReply, ApiError> {
    let check = parse_check(&check)?;
    state.execute(Operation::ApplyCorrection { check }).await
}

fn parse_check(raw: &str) -> Result<CheckId, ApiError> {
    raw.parse::<CheckId>()
        .map_err(|_| ApiError::UnknownCheck(raw.to_string()))
}

fn parse_bound(raw: &str) -> Result<f64, ApiError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::BadBound(raw.to_string()))
}
