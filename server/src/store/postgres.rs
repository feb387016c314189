use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Event, EventDraft, Notification, Role, StatusChange, Story};
use crate::store::{
    EventOrder, EventQuery, EventStore, FavoriteStore, NotificationStore, RoleStore, StoryStore,
};
use crate::utils::error::{store_error, AppError};

const STORY_COLUMNS: &str = "id, user_id, image_url, caption, created_at, expires_at";

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, kind, link, is_read, created_at";

const EVENT_COLUMNS: &str = "id, owner_id, title, description, category, date_start, date_end, \
     city, address, latitude, longitude, is_free, price, image_url, status, rejection_reason, \
     created_at, updated_at";

/// Escape `%`, `_` and `\` so user input is matched literally by ILIKE.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &EventQuery) {
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(owner_id) = query.owner_id {
        qb.push(" AND owner_id = ").push_bind(owner_id);
    }
    if let Some(ids) = &query.ids {
        qb.push(" AND id = ANY(").push_bind(ids.clone()).push(")");
    }
    if let Some(categories) = query.category.as_list() {
        let names: Vec<String> = categories.iter().map(|c| c.as_str().to_string()).collect();
        qb.push(" AND category::text = ANY(").push_bind(names).push(")");
    }
    if let Some(city) = query.city.as_value() {
        qb.push(" AND city = ").push_bind(city.to_string());
    }
    if !query.search.is_empty() {
        let pattern = like_pattern(query.search.needle());
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone());
        if query.search.include_city() {
            qb.push(" OR city ILIKE ").push_bind(pattern);
        }
        qb.push(")");
    }
    if query.geotagged_only {
        qb.push(" AND latitude IS NOT NULL AND longitude IS NOT NULL");
    }
    match query.order {
        EventOrder::StartAscending => qb.push(" ORDER BY date_start ASC"),
        EventOrder::CreatedDescending => qb.push(" ORDER BY created_at DESC"),
    };
}

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn select(&self, query: &EventQuery) -> Result<Vec<Event>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM events WHERE TRUE",
            EVENT_COLUMNS
        ));
        push_filters(&mut qb, query);
        debug!(sql = qb.sql(), "Selecting events");

        qb.build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to select events", e))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to load event", e))
    }

    async fn insert(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (
                id, owner_id, title, description, category, date_start, date_end,
                city, address, latitude, longitude, is_free, price, image_url,
                status, rejection_reason, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(event.owner_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.category)
        .bind(event.date_start)
        .bind(event.date_end)
        .bind(&event.city)
        .bind(&event.address)
        .bind(event.latitude)
        .bind(event.longitude)
        .bind(event.is_free)
        .bind(event.price)
        .bind(&event.image_url)
        .bind(event.status)
        .bind(&event.rejection_reason)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("Failed to create event", e))
    }

    async fn update_content(
        &self,
        id: Uuid,
        draft: &EventDraft,
        status: &StatusChange,
    ) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = $2, description = $3, category = $4, date_start = $5, date_end = $6,
                city = $7, address = $8, latitude = $9, longitude = $10, is_free = $11,
                price = $12, image_url = $13, status = $14, rejection_reason = $15,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.category)
        .bind(draft.date_start)
        .bind(draft.date_end)
        .bind(&draft.city)
        .bind(&draft.address)
        .bind(draft.latitude)
        .bind(draft.longitude)
        .bind(draft.is_free)
        .bind(draft.price)
        .bind(&draft.image_url)
        .bind(status.status())
        .bind(status.rejection_reason())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to update event", e))?
        .ok_or_else(|| AppError::NotFound(format!("Event '{}' was not found", id)))
    }

    async fn update_status(&self, id: Uuid, change: &StatusChange) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET status = $2, rejection_reason = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(change.status())
        .bind(change.rejection_reason())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to update event status", e))?
        .ok_or_else(|| AppError::NotFound(format!("Event '{}' was not found", id)))
    }
}

#[derive(Clone)]
pub struct PgFavoriteStore {
    pool: PgPool,
}

impl PgFavoriteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteStore for PgFavoriteStore {
    async fn select(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        sqlx::query_scalar::<_, Uuid>("SELECT event_id FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to load favorites", e))
    }

    async fn insert(&self, user_id: Uuid, event_id: Uuid) -> Result<(), AppError> {
        sqlx::query("INSERT INTO favorites (user_id, event_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Failed to add favorite", e))?;
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, event_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Failed to remove favorite", e))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2)",
        )
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("Failed to check role", e))
    }
}

#[derive(Clone)]
pub struct PgStoryStore {
    pool: PgPool,
}

impl PgStoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoryStore for PgStoryStore {
    async fn select_active(&self, now: DateTime<Utc>) -> Result<Vec<Story>, AppError> {
        sqlx::query_as::<_, Story>(&format!(
            "SELECT {} FROM stories WHERE expires_at > $1 ORDER BY created_at DESC",
            STORY_COLUMNS
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("Failed to load stories", e))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Story>, AppError> {
        sqlx::query_as::<_, Story>(&format!(
            "SELECT {} FROM stories WHERE id = $1",
            STORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to load story", e))
    }

    async fn insert(&self, story: &Story) -> Result<Story, AppError> {
        sqlx::query_as::<_, Story>(&format!(
            r#"
            INSERT INTO stories (id, user_id, image_url, caption, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            STORY_COLUMNS
        ))
        .bind(story.id)
        .bind(story.user_id)
        .bind(&story.image_url)
        .bind(&story.caption)
        .bind(story.created_at)
        .bind(story.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("Failed to create story", e))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Failed to delete story", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn select(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("Failed to load notifications", e))
    }

    async fn insert(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, kind, link, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind)
        .bind(&notification.link)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to create notification", e))?;
        Ok(())
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to mark notification as read", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to mark notifications as read", e))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{CategoryFilter, CityFilter, TextSearch};
    use crate::models::{EventCategory, EventStatus};

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("jazz"), "%jazz%");
        assert_eq!(like_pattern("100%_\\"), "%100\\%\\_\\\\%");
    }

    #[test]
    fn test_public_listing_sql() {
        let query = EventQuery {
            status: Some(EventStatus::Approved),
            category: CategoryFilter::Only(EventCategory::Music),
            city: CityFilter::Only("Kazan".to_string()),
            search: TextSearch::new("jazz", true),
            geotagged_only: true,
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM events WHERE TRUE");
        push_filters(&mut qb, &query);

        assert_eq!(
            qb.sql(),
            "SELECT id FROM events WHERE TRUE AND status = $1 AND category::text = ANY($2) \
             AND city = $3 AND (title ILIKE $4 OR description ILIKE $5 OR city ILIKE $6) \
             AND latitude IS NOT NULL AND longitude IS NOT NULL ORDER BY date_start ASC"
        );
    }

    #[test]
    fn test_review_queue_sql() {
        let query = EventQuery {
            status: Some(EventStatus::Pending),
            order: EventOrder::CreatedDescending,
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM events WHERE TRUE");
        push_filters(&mut qb, &query);

        assert_eq!(
            qb.sql(),
            "SELECT id FROM events WHERE TRUE AND status = $1 ORDER BY created_at DESC"
        );
    }
}
