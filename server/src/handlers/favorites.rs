use axum::extract::{Path, State};
use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{CurrentUser, SignedIn};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Serialize)]
pub struct FavoriteToggled {
    pub event_id: Uuid,
    pub favorited: bool,
}

pub async fn list_ids(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response, AppError> {
    let mut ids: Vec<Uuid> = state.favorites.ids(user_id).await?.into_iter().collect();
    ids.sort();
    Ok(success(ids, "Favorites loaded"))
}

/// Drop the mirror's contents and read them again from the store.
pub async fn reload(
    State(state): State<AppState>,
    SignedIn(user_id): SignedIn,
) -> Result<Response, AppError> {
    let mut ids: Vec<Uuid> = state
        .favorites
        .reload(Some(user_id))
        .await?
        .into_iter()
        .collect();
    ids.sort();
    Ok(success(ids, "Favorites reloaded"))
}

/// Anonymous callers get `UNAUTHENTICATED` before any store is touched.
pub async fn toggle(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let favorited = state.favorites.toggle(user_id, event_id).await?;
    let message = if favorited {
        "Added to favorites"
    } else {
        "Removed from favorites"
    };
    Ok(success(
        FavoriteToggled {
            event_id,
            favorited,
        },
        message,
    ))
}
