use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{
    events, favorites, health_check, moderation, notifications, profile, stories,
};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route(
            "/events",
            get(events::list_events).post(events::create_event),
        )
        .route(
            "/events/:id",
            get(events::get_event).put(events::update_event),
        )
        .route("/moderation/events", get(moderation::list_queue))
        .route(
            "/moderation/events/status",
            post(moderation::bulk_transition),
        )
        .route(
            "/moderation/events/:id/status",
            post(moderation::transition),
        )
        .route("/favorites", get(favorites::list_ids))
        .route("/favorites/:event_id/toggle", post(favorites::toggle))
        .route("/me/events", get(profile::my_events))
        .route("/me/favorites", get(profile::favorite_events))
        .route("/me/favorites/reload", post(favorites::reload))
        .route("/me/roles", get(profile::my_roles))
        .route("/me/session", delete(profile::sign_out))
        .route("/me/notifications", get(notifications::list))
        .route(
            "/me/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/me/notifications/:id/read",
            post(notifications::mark_read),
        )
        .route(
            "/stories",
            get(stories::list_stories).post(stories::create_story),
        )
        .route("/stories/:id", delete(stories::delete_story));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(config))
        .layer(create_cors_layer(config))
}
