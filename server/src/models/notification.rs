use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::event::Event;
use crate::models::status::EventStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// In-app notification shown in the user's bell menu.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Client route opened when the notification is clicked.
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        link: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            message: message.into(),
            kind,
            link,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    /// Message to the owner after a moderator changed the status of `event`.
    pub fn status_changed(event: &Event) -> Self {
        let link = Some(format!("/events/{}", event.id));
        match event.status {
            EventStatus::Approved => Self::new(
                event.owner_id,
                NotificationKind::Success,
                "Event approved",
                format!("\"{}\" is now visible to everyone", event.title),
                link,
            ),
            EventStatus::Rejected => {
                let message = match event.rejection_reason.as_deref() {
                    Some(reason) => format!("\"{}\" was rejected: {}", event.title, reason),
                    None => format!("\"{}\" was rejected", event.title),
                };
                Self::new(
                    event.owner_id,
                    NotificationKind::Error,
                    "Event rejected",
                    message,
                    link,
                )
            }
            EventStatus::Pending => Self::new(
                event.owner_id,
                NotificationKind::Info,
                "Event back in review",
                format!("\"{}\" is waiting for moderation again", event.title),
                link,
            ),
        }
    }
}

/// Notifications of one user, newest first, with the unread count.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationFeed {
    pub unread_count: usize,
    pub notifications: Vec<Notification>,
}

impl NotificationFeed {
    pub fn new(notifications: Vec<Notification>) -> Self {
        Self {
            unread_count: notifications.iter().filter(|n| !n.is_read).count(),
            notifications,
        }
    }
}
