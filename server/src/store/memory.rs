use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::{Event, EventDraft, Notification, Role, StatusChange, Story};
use crate::store::{
    EventQuery, EventStore, FavoriteStore, NotificationStore, RoleStore, StoryStore,
};
use crate::utils::error::AppError;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Event '{}' was not found", id))
}

/// Event rows kept in process. Writes to ids registered with
/// [`MemoryEventStore::fail_writes_for`] fail with a store error.
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<HashMap<Uuid, Event>>,
    failing: Mutex<HashSet<Uuid>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, event: Event) {
        self.events.write().await.insert(event.id, event);
    }

    pub async fn fail_writes_for(&self, id: Uuid) {
        self.failing.lock().await.insert(id);
    }

    async fn check_writable(&self, id: Uuid) -> Result<(), AppError> {
        if self.failing.lock().await.contains(&id) {
            return Err(AppError::StoreError(format!(
                "write to event '{}' was refused",
                id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn select(&self, query: &EventQuery) -> Result<Vec<Event>, AppError> {
        let mut rows: Vec<Event> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        query.sort(&mut rows);
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn insert(&self, event: &Event) -> Result<Event, AppError> {
        let mut events = self.events.write().await;
        if events.contains_key(&event.id) {
            return Err(AppError::StoreError(format!(
                "duplicate key value violates unique constraint: event '{}'",
                event.id
            )));
        }
        events.insert(event.id, event.clone());
        Ok(event.clone())
    }

    async fn update_content(
        &self,
        id: Uuid,
        draft: &EventDraft,
        status: &StatusChange,
    ) -> Result<Event, AppError> {
        self.check_writable(id).await?;
        let mut events = self.events.write().await;
        let event = events.get_mut(&id).ok_or_else(|| not_found(id))?;
        event.replace_content(draft.clone());
        event.apply_status(status);
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn update_status(&self, id: Uuid, change: &StatusChange) -> Result<Event, AppError> {
        self.check_writable(id).await?;
        let mut events = self.events.write().await;
        let event = events.get_mut(&id).ok_or_else(|| not_found(id))?;
        event.apply_status(change);
        event.updated_at = Utc::now();
        Ok(event.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteCall {
    Select(Uuid),
    Insert(Uuid, Uuid),
    Delete(Uuid, Uuid),
}

/// Favorite rows kept in process, with a call log and switchable failures.
/// Inserting an existing pair fails like the composite primary key would.
#[derive(Default)]
pub struct MemoryFavoriteStore {
    rows: Mutex<HashSet<(Uuid, Uuid)>>,
    calls: Mutex<Vec<FavoriteCall>>,
    fail_inserts: Mutex<bool>,
    fail_deletes: Mutex<bool>,
    latency: Mutex<Option<Duration>>,
}

impl MemoryFavoriteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, user_id: Uuid, event_id: Uuid) {
        self.rows.lock().await.insert((user_id, event_id));
    }

    pub async fn calls(&self) -> Vec<FavoriteCall> {
        self.calls.lock().await.clone()
    }

    pub async fn contains(&self, user_id: Uuid, event_id: Uuid) -> bool {
        self.rows.lock().await.contains(&(user_id, event_id))
    }

    pub async fn set_fail_inserts(&self, fail: bool) {
        *self.fail_inserts.lock().await = fail;
    }

    pub async fn set_fail_deletes(&self, fail: bool) {
        *self.fail_deletes.lock().await = fail;
    }

    /// Delay applied to every write, to keep requests in flight.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().await = latency;
    }

    async fn settle(&self) {
        let latency = *self.latency.lock().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl FavoriteStore for MemoryFavoriteStore {
    async fn select(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        self.calls.lock().await.push(FavoriteCall::Select(user_id));
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, event)| *event)
            .collect())
    }

    async fn insert(&self, user_id: Uuid, event_id: Uuid) -> Result<(), AppError> {
        self.calls
            .lock()
            .await
            .push(FavoriteCall::Insert(user_id, event_id));
        self.settle().await;

        if *self.fail_inserts.lock().await {
            return Err(AppError::StoreError("Failed to add favorite".to_string()));
        }
        if !self.rows.lock().await.insert((user_id, event_id)) {
            return Err(AppError::StoreError(
                "duplicate key value violates unique constraint \"favorites_pkey\"".to_string(),
            ));
        }
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, event_id: Uuid) -> Result<(), AppError> {
        self.calls
            .lock()
            .await
            .push(FavoriteCall::Delete(user_id, event_id));
        self.settle().await;

        if *self.fail_deletes.lock().await {
            return Err(AppError::StoreError(
                "Failed to remove favorite".to_string(),
            ));
        }
        self.rows.lock().await.remove(&(user_id, event_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRoleStore {
    roles: RwLock<HashMap<Uuid, HashSet<Role>>>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn grant(&self, user_id: Uuid, role: Role) {
        self.roles
            .write()
            .await
            .entry(user_id)
            .or_default()
            .insert(role);
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, AppError> {
        Ok(self
            .roles
            .read()
            .await
            .get(&user_id)
            .map_or(false, |roles| roles.contains(&role)))
    }
}

#[derive(Default)]
pub struct MemoryStoryStore {
    stories: RwLock<HashMap<Uuid, Story>>,
}

impl MemoryStoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, story: Story) {
        self.stories.write().await.insert(story.id, story);
    }
}

#[async_trait]
impl StoryStore for MemoryStoryStore {
    async fn select_active(&self, now: DateTime<Utc>) -> Result<Vec<Story>, AppError> {
        let mut rows: Vec<Story> = self
            .stories
            .read()
            .await
            .values()
            .filter(|s| s.is_active(now))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Story>, AppError> {
        Ok(self.stories.read().await.get(&id).cloned())
    }

    async fn insert(&self, story: &Story) -> Result<Story, AppError> {
        self.stories.write().await.insert(story.id, story.clone());
        Ok(story.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.stories.write().await.remove(&id).is_some())
    }
}

/// Notification rows kept in process. Inserts can be switched to fail.
#[derive(Default)]
pub struct MemoryNotificationStore {
    rows: RwLock<Vec<Notification>>,
    fail_inserts: Mutex<bool>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_inserts(&self, fail: bool) {
        *self.fail_inserts.lock().await = fail;
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn select(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let mut rows: Vec<Notification> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(&self, notification: &Notification) -> Result<(), AppError> {
        if *self.fail_inserts.lock().await {
            return Err(AppError::StoreError(
                "Failed to create notification".to_string(),
            ));
        }
        self.rows.write().await.push(notification.clone());
        Ok(())
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut flipped = 0;
        for n in self
            .rows
            .write()
            .await
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            flipped += 1;
        }
        Ok(flipped)
    }
}
