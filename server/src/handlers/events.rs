use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::auth::{role_summary, CurrentUser, SignedIn};
use crate::filters::ListingParams;
use crate::models::EventDraft;
use crate::services::Viewer;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Response, AppError> {
    let (filter, offset) = params.into_filter()?;
    let events = state.listing.public(&filter, offset).await?;
    let message = format!("Found {} events", events.len());
    Ok(success(events, message))
}

pub async fn create_event(
    State(state): State<AppState>,
    SignedIn(owner_id): SignedIn,
    Json(draft): Json<EventDraft>,
) -> Result<Response, AppError> {
    let event = state.events.create(owner_id, draft).await?;
    Ok(created(event, "Event submitted for moderation"))
}

pub async fn get_event(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let can_moderate = match user_id {
        Some(id) => role_summary(state.roles.as_ref(), id).await?.can_moderate(),
        None => false,
    };
    let viewer = Viewer {
        user_id,
        can_moderate,
    };

    let event = state.events.detail(viewer, event_id).await?;
    Ok(success(event, "Event loaded"))
}

pub async fn update_event(
    State(state): State<AppState>,
    SignedIn(actor_id): SignedIn,
    Path(event_id): Path<Uuid>,
    Json(draft): Json<EventDraft>,
) -> Result<Response, AppError> {
    let event = state.events.edit(actor_id, event_id, draft).await?;
    Ok(success(
        event,
        "Changes saved, event sent back to moderation",
    ))
}
