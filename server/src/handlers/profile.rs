use axum::extract::State;
use axum::response::Response;

use crate::auth::{role_summary, SignedIn};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};

pub async fn my_events(
    State(state): State<AppState>,
    SignedIn(user_id): SignedIn,
) -> Result<Response, AppError> {
    let events = state.events.owned_by(user_id).await?;
    Ok(success(events, "Your events"))
}

pub async fn favorite_events(
    State(state): State<AppState>,
    SignedIn(user_id): SignedIn,
) -> Result<Response, AppError> {
    let ids = state.favorites.ids(Some(user_id)).await?;
    let events = state.listing.by_ids(ids.into_iter().collect()).await?;
    Ok(success(events, "Your favorites"))
}

pub async fn my_roles(
    State(state): State<AppState>,
    SignedIn(user_id): SignedIn,
) -> Result<Response, AppError> {
    let summary = role_summary(state.roles.as_ref(), user_id).await?;
    Ok(success(summary, "Roles loaded"))
}

pub async fn sign_out(
    State(state): State<AppState>,
    SignedIn(user_id): SignedIn,
) -> Result<Response, AppError> {
    let message = if state.favorites.sign_out(user_id) {
        "Session closed"
    } else {
        "No active session"
    };
    Ok(empty_success(message))
}
