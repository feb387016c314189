use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{Event, EventDraft, StatusChange};
use crate::store::{EventOrder, EventQuery, EventStore};
use crate::utils::error::AppError;

/// Who is looking at an event, for visibility checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer {
    pub user_id: Option<Uuid>,
    pub can_moderate: bool,
}

/// Owner-side operations: submission, edits and the profile listing.
#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }

    pub async fn create(&self, owner_id: Uuid, draft: EventDraft) -> Result<Event, AppError> {
        let draft = draft.validate()?;
        let event = Event::submitted(owner_id, draft, Utc::now());
        let created = self.events.insert(&event).await?;
        info!(event_id = %created.id, %owner_id, "Event submitted for moderation");
        Ok(created)
    }

    /// Replace the content of an owned event. Any edit sends the event back to
    /// review and clears a previous rejection reason.
    pub async fn edit(
        &self,
        actor_id: Uuid,
        event_id: Uuid,
        draft: EventDraft,
    ) -> Result<Event, AppError> {
        let event = self.find(event_id).await?;
        if event.owner_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the owner can edit this event".to_string(),
            ));
        }

        let draft = draft.validate()?;
        let updated = self
            .events
            .update_content(event_id, &draft, &StatusChange::resubmitted())
            .await?;
        info!(%event_id, previous = %event.status, "Event edited, resubmitted for moderation");
        Ok(updated)
    }

    /// Approved events are public; anything else is only shown to its owner
    /// and to moderators.
    pub async fn detail(&self, viewer: Viewer, event_id: Uuid) -> Result<Event, AppError> {
        let event = self.find(event_id).await?;
        let is_owner = viewer.user_id == Some(event.owner_id);
        if event.is_public() || is_owner || viewer.can_moderate {
            Ok(event)
        } else {
            Err(not_found(event_id))
        }
    }

    pub async fn owned_by(&self, owner_id: Uuid) -> Result<Vec<Event>, AppError> {
        self.events
            .select(&EventQuery {
                owner_id: Some(owner_id),
                order: EventOrder::CreatedDescending,
                ..Default::default()
            })
            .await
    }

    async fn find(&self, event_id: Uuid) -> Result<Event, AppError> {
        self.events
            .get(event_id)
            .await?
            .ok_or_else(|| not_found(event_id))
    }
}

fn not_found(event_id: Uuid) -> AppError {
    AppError::NotFound(format!("Event '{}' was not found", event_id))
}
