use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Moderator;
use crate::models::{BulkOutcome, EventStatus};
use crate::services::ModerationParams;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// Status arrives as free text so unknown values surface as `INVALID_TRANSITION`
/// instead of a generic body rejection.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkTransitionRequest {
    pub ids: Vec<Uuid>,
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkTransitionResponse {
    pub affected: usize,
    #[serde(flatten)]
    pub outcome: BulkOutcome,
}

pub async fn list_queue(
    State(state): State<AppState>,
    Moderator(_): Moderator,
    Query(params): Query<ModerationParams>,
) -> Result<Response, AppError> {
    let (status, filter) = params.into_filter()?;
    let events = state.moderation.list(status, filter).await?;
    let message = format!("{} events with status {}", events.len(), status);
    Ok(success(events, message))
}

pub async fn transition(
    State(state): State<AppState>,
    Moderator(actor_id): Moderator,
    Path(event_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Response, AppError> {
    let status: EventStatus = request.status.parse()?;
    let event = state
        .moderation
        .transition(actor_id, event_id, status, request.reason)
        .await?;
    Ok(success(event, format!("Event status is now {}", status)))
}

pub async fn bulk_transition(
    State(state): State<AppState>,
    Moderator(actor_id): Moderator,
    Json(request): Json<BulkTransitionRequest>,
) -> Result<Response, AppError> {
    let status: EventStatus = request.status.parse()?;
    let outcome = state
        .moderation
        .bulk_transition(actor_id, &request.ids, status, request.reason)
        .await?;

    let message = if outcome.is_complete() {
        format!("{} events set to {}", outcome.affected(), status)
    } else {
        format!(
            "{} events set to {}, {} failed",
            outcome.affected(),
            status,
            outcome.failed.len()
        )
    };
    Ok(success(
        BulkTransitionResponse {
            affected: outcome.affected(),
            outcome,
        },
        message,
    ))
}
