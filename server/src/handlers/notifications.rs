use axum::extract::{Path, State};
use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::SignedIn;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

pub async fn list(
    State(state): State<AppState>,
    SignedIn(user_id): SignedIn,
) -> Result<Response, AppError> {
    let feed = state.notifications.feed(user_id).await?;
    let message = format!("{} unread notifications", feed.unread_count);
    Ok(success(feed, message))
}

pub async fn mark_read(
    State(state): State<AppState>,
    SignedIn(user_id): SignedIn,
    Path(notification_id): Path<Uuid>,
) -> Result<Response, AppError> {
    state.notifications.mark_read(user_id, notification_id).await?;
    Ok(empty_success("Notification marked as read"))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    SignedIn(user_id): SignedIn,
) -> Result<Response, AppError> {
    let updated = state.notifications.mark_all_read(user_id).await?;
    Ok(success(MarkedRead { updated }, "All notifications marked as read"))
}
