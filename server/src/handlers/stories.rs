use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::auth::{CurrentUser, SignedIn};
use crate::models::StoryDraft;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub async fn list_stories(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response, AppError> {
    let groups = state.stories.feed(user_id).await?;
    let message = format!("{} story groups", groups.len());
    Ok(success(groups, message))
}

pub async fn create_story(
    State(state): State<AppState>,
    SignedIn(user_id): SignedIn,
    Json(draft): Json<StoryDraft>,
) -> Result<Response, AppError> {
    let story = state.stories.post(user_id, draft).await?;
    Ok(created(story, "Story posted"))
}

pub async fn delete_story(
    State(state): State<AppState>,
    SignedIn(user_id): SignedIn,
    Path(story_id): Path<Uuid>,
) -> Result<Response, AppError> {
    state.stories.remove(user_id, story_id).await?;
    Ok(empty_success("Story deleted"))
}
