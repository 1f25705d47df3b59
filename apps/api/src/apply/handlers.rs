//! Axum route handlers for the auto-apply API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::apply::engine::ApplyRequest;
use crate::apply::payload::Platform;
use crate::errors::AppError;
use crate::models::application::{Application, ApplicationPatch, ApplyLogEntry, Stage};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyBody {
    pub platform: String,
    pub job_url: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub mapper_args: Value,
    #[serde(default)]
    pub opt_in: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    pub application_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StageChange {
    pub stage: Stage,
}

#[derive(Debug, Serialize)]
pub struct BusPostResponse {
    pub delivered: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketResponse {
    pub key: String,
    pub tokens: u32,
    pub capacity: u32,
    pub refill_interval_ms: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/apply
///
/// Runs the full auto-apply pipeline. May be delayed by the platform throttle.
pub async fn handle_apply(
    State(state): State<AppState>,
    Json(body): Json<ApplyBody>,
) -> Result<(StatusCode, Json<ApplyResponse>), AppError> {
    let platform: Platform = body.platform.parse()?;

    let application_id = state
        .engine
        .auto_apply(ApplyRequest {
            platform,
            job_url: body.job_url,
            company: body.company,
            role: body.role,
            mapper_args: body.mapper_args,
            opt_in: body.opt_in,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApplyResponse { application_id })))
}

/// GET /api/v1/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(state.engine.store().list().await?))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    state
        .engine
        .store()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}

/// PATCH /api/v1/applications/:id/stage
///
/// Moves the application to another pipeline stage and logs the transition.
pub async fn handle_change_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(change): Json<StageChange>,
) -> Result<StatusCode, AppError> {
    let store = state.engine.store();
    let current = store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    if current.stage == change.stage {
        return Ok(StatusCode::NO_CONTENT);
    }

    store
        .update(
            id,
            ApplicationPatch {
                stage: Some(change.stage),
                ..Default::default()
            },
        )
        .await?;
    store
        .add_log(
            id,
            ApplyLogEntry::info(format!(
                "Stage changed from {} to {}",
                current.stage, change.stage
            ))
            .with_meta("from", current.stage.as_str())
            .with_meta("to", change.stage.as_str()),
        )
        .await?;

    info!("Application {id} moved {} -> {}", current.stage, change.stage);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/bus
///
/// Entry point for an extension bridge. The body is posted verbatim; messages
/// without the auto-apply marker are accepted and ignored by subscribers.
pub async fn handle_bus_post(
    State(state): State<AppState>,
    Json(message): Json<Value>,
) -> (StatusCode, Json<BusPostResponse>) {
    let delivered = state.engine.bus().post_raw(message);
    (StatusCode::ACCEPTED, Json(BusPostResponse { delivered }))
}

/// GET /api/v1/throttle/:key
pub async fn handle_throttle_status(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<BucketResponse>, AppError> {
    let snapshot = state
        .throttle
        .snapshot(&key)
        .ok_or_else(|| AppError::NotFound(format!("No throttle bucket for '{key}'")))?;

    Ok(Json(BucketResponse {
        key,
        tokens: snapshot.tokens,
        capacity: snapshot.capacity,
        refill_interval_ms: u64::try_from(snapshot.refill_interval.as_millis()).unwrap_or(u64::MAX),
    }))
}
