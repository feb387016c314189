//! Backing stores for events, favorites, roles, stories and notifications.
//!
//! Services only see the traits below. `postgres` is the production backend,
//! `memory` keeps everything in process for local runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::filters::{CategoryFilter, CityFilter, TextSearch};
use crate::models::{Event, EventDraft, EventStatus, Notification, Role, StatusChange, Story};
use crate::utils::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::{
    FavoriteCall, MemoryEventStore, MemoryFavoriteStore, MemoryNotificationStore, MemoryRoleStore,
    MemoryStoryStore,
};
pub use postgres::{
    PgEventStore, PgFavoriteStore, PgNotificationStore, PgRoleStore, PgStoryStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOrder {
    /// Public listings: soonest first.
    #[default]
    StartAscending,
    /// Review queues and profile pages: newest submissions first.
    CreatedDescending,
}

/// Row selection pushed down to an [`EventStore`].
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub status: Option<EventStatus>,
    pub owner_id: Option<Uuid>,
    pub ids: Option<Vec<Uuid>>,
    pub category: CategoryFilter,
    pub city: CityFilter,
    pub search: TextSearch,
    pub geotagged_only: bool,
    pub order: EventOrder,
}

impl EventQuery {
    pub fn matches(&self, event: &Event) -> bool {
        self.status.map_or(true, |s| event.status == s)
            && self.owner_id.map_or(true, |o| event.owner_id == o)
            && self.ids.as_ref().map_or(true, |ids| ids.contains(&event.id))
            && self.category.matches(event.category)
            && self.city.matches(event.city.as_deref())
            && self.search.matches(event)
            && (!self.geotagged_only || event.has_coordinates())
    }

    pub fn sort(&self, events: &mut [Event]) {
        match self.order {
            EventOrder::StartAscending => events.sort_by(|a, b| a.date_start.cmp(&b.date_start)),
            EventOrder::CreatedDescending => {
                events.sort_by(|a, b| b.created_at.cmp(&a.created_at))
            }
        }
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn select(&self, query: &EventQuery) -> Result<Vec<Event>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Event>, AppError>;

    async fn insert(&self, event: &Event) -> Result<Event, AppError>;

    /// Replace the owner-editable content and write `status` in the same update.
    /// Fails with `NotFound` when the row is gone.
    async fn update_content(
        &self,
        id: Uuid,
        draft: &EventDraft,
        status: &StatusChange,
    ) -> Result<Event, AppError>;

    /// Fails with `NotFound` when the row is gone.
    async fn update_status(&self, id: Uuid, change: &StatusChange) -> Result<Event, AppError>;
}

#[async_trait]
pub trait FavoriteStore: Send + Sync {
    async fn select(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    async fn insert(&self, user_id: Uuid, event_id: Uuid) -> Result<(), AppError>;

    async fn delete(&self, user_id: Uuid, event_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, AppError>;
}

#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Stories with `expires_at` after `now`, newest first.
    async fn select_active(&self, now: DateTime<Utc>) -> Result<Vec<Story>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Story>, AppError>;

    async fn insert(&self, story: &Story) -> Result<Story, AppError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Notifications of `user_id`, newest first.
    async fn select(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError>;

    async fn insert(&self, notification: &Notification) -> Result<(), AppError>;

    /// Returns whether a notification of `user_id` with that id exists.
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    /// Returns how many notifications flipped to read.
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError>;
}
