use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Event, Notification, NotificationFeed};
use crate::store::NotificationStore;
use crate::utils::error::AppError;

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    pub async fn feed(&self, user_id: Uuid) -> Result<NotificationFeed, AppError> {
        Ok(NotificationFeed::new(self.store.select(user_id).await?))
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if self.store.mark_read(user_id, id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "Notification '{}' was not found",
                id
            )))
        }
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.store.mark_all_read(user_id).await
    }

    /// Tell the owner about a moderation decision. Delivery is best effort:
    /// a failed write is logged and never undoes the decision.
    pub async fn status_changed(&self, event: &Event) {
        let notification = Notification::status_changed(event);
        match self.store.insert(&notification).await {
            Ok(()) => debug!(
                event_id = %event.id,
                user_id = %notification.user_id,
                "Owner notified of status change"
            ),
            Err(e) => warn!(
                event_id = %event.id,
                user_id = %notification.user_id,
                error = %e,
                "Failed to notify owner of status change"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use crate::store::MemoryNotificationStore;

    #[tokio::test]
    async fn test_feed_and_read_state() {
        let store = Arc::new(MemoryNotificationStore::new());
        let service = NotificationService::new(store.clone());
        let user = Uuid::new_v4();
        let first = Notification::new(user, NotificationKind::Info, "a", "b", None);
        store.insert(&first).await.unwrap();
        store
            .insert(&Notification::new(user, NotificationKind::Success, "c", "d", None))
            .await
            .unwrap();

        assert_eq!(service.feed(user).await.unwrap().unread_count, 2);

        service.mark_read(user, first.id).await.unwrap();
        assert_eq!(service.feed(user).await.unwrap().unread_count, 1);

        assert_eq!(service.mark_all_read(user).await.unwrap(), 1);
        let feed = service.feed(user).await.unwrap();
        assert_eq!(feed.unread_count, 0);
        assert_eq!(feed.notifications.len(), 2);
    }

    #[tokio::test]
    async fn test_foreign_notification_is_not_found() {
        let store = Arc::new(MemoryNotificationStore::new());
        let service = NotificationService::new(store.clone());
        let n = Notification::new(Uuid::new_v4(), NotificationKind::Info, "a", "b", None);
        store.insert(&n).await.unwrap();

        let err = service.mark_read(Uuid::new_v4(), n.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
