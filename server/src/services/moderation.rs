use chrono::Utc;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::filters::{CategoryFilter, CityFilter, TextSearch};
use crate::models::{
    BulkFailure, BulkOutcome, Event, EventStatus, ModerationAction, StatusUpdate,
};
use crate::services::NotificationService;
use crate::store::{EventOrder, EventQuery, EventStore};
use crate::utils::error::AppError;

/// Optional narrowing of a review queue.
#[derive(Debug, Clone, Default)]
pub struct ModerationFilter {
    pub category: CategoryFilter,
    pub city: CityFilter,
    /// Matches title, description or city.
    pub search: TextSearch,
}

/// Raw query string of `GET /api/moderation/events`.
#[derive(Debug, Default, Deserialize)]
pub struct ModerationParams {
    pub status: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub q: Option<String>,
}

impl ModerationParams {
    /// The queue defaults to events awaiting review.
    pub fn into_filter(self) -> Result<(EventStatus, ModerationFilter), AppError> {
        let status = match self.status.as_deref() {
            None | Some("") => EventStatus::Pending,
            Some(raw) => raw.parse()?,
        };
        let filter = ModerationFilter {
            category: CategoryFilter::parse(self.category.as_deref())?,
            city: CityFilter::parse(self.city.as_deref()),
            search: TextSearch::new(self.q.as_deref().unwrap_or_default(), true),
        };
        Ok((status, filter))
    }
}

/// Applies moderator decisions to events.
///
/// Callers are expected to have checked the actor's role already; the
/// service only records who acted. Owners are notified of every change.
#[derive(Clone)]
pub struct ModerationService {
    events: Arc<dyn EventStore>,
    notifications: NotificationService,
}

impl ModerationService {
    pub fn new(events: Arc<dyn EventStore>, notifications: NotificationService) -> Self {
        Self {
            events,
            notifications,
        }
    }

    pub async fn transition(
        &self,
        actor_id: Uuid,
        event_id: Uuid,
        new_status: EventStatus,
        reason: Option<String>,
    ) -> Result<Event, AppError> {
        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event '{}' was not found", event_id)))?;

        let change = match event.status.transition(new_status, reason) {
            StatusUpdate::Unchanged => {
                debug!(%event_id, status = %new_status, "Status already set, nothing to write");
                return Ok(event);
            }
            StatusUpdate::Changed(change) => change,
        };

        let updated = self.events.update_status(event_id, &change).await?;

        let action = ModerationAction {
            event_id,
            status: change.status(),
            reason: change.rejection_reason().map(str::to_string),
            actor_id,
            at: Utc::now(),
        };
        info!(
            event_id = %action.event_id,
            actor_id = %action.actor_id,
            from = %event.status,
            to = %action.status,
            reason = ?action.reason,
            at = %action.at,
            "Moderation action applied"
        );

        self.notifications.status_changed(&updated).await;
        Ok(updated)
    }

    /// Apply one decision to many events. Ids are deduplicated, every id ends
    /// up in exactly one of `succeeded` or `failed`, and nothing is rolled back.
    pub async fn bulk_transition(
        &self,
        actor_id: Uuid,
        event_ids: &[Uuid],
        new_status: EventStatus,
        reason: Option<String>,
    ) -> Result<BulkOutcome, AppError> {
        if event_ids.is_empty() {
            return Err(AppError::ValidationError(
                "At least one event id is required".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(event_ids.len());
        let unique: Vec<Uuid> = event_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let mut outcome = BulkOutcome::default();
        for event_id in unique {
            match self
                .transition(actor_id, event_id, new_status, reason.clone())
                .await
            {
                Ok(_) => outcome.succeeded.push(event_id),
                Err(e) => {
                    warn!(%event_id, error = %e, "Bulk transition failed for event");
                    outcome.failed.push(BulkFailure::new(event_id, &e));
                }
            }
        }

        info!(
            actor_id = %actor_id,
            status = %new_status,
            affected = outcome.affected(),
            failed = outcome.failed.len(),
            "Bulk moderation finished"
        );
        Ok(outcome)
    }

    /// Review queue for one status, newest submissions first.
    pub async fn list(
        &self,
        status: EventStatus,
        filter: ModerationFilter,
    ) -> Result<Vec<Event>, AppError> {
        let query = EventQuery {
            status: Some(status),
            category: filter.category,
            city: filter.city,
            search: filter.search,
            order: EventOrder::CreatedDescending,
            ..Default::default()
        };
        self.events.select(&query).await
    }
}
