use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{group_stories, Story, StoryDraft, StoryGroup};
use crate::store::StoryStore;
use crate::utils::error::AppError;

#[derive(Clone)]
pub struct StoryService {
    stories: Arc<dyn StoryStore>,
}

impl StoryService {
    pub fn new(stories: Arc<dyn StoryStore>) -> Self {
        Self { stories }
    }

    /// Active stories grouped by author, the viewer's own group first.
    pub async fn feed(&self, viewer: Option<Uuid>) -> Result<Vec<StoryGroup>, AppError> {
        let stories = self.stories.select_active(Utc::now()).await?;
        Ok(group_stories(stories, viewer))
    }

    pub async fn post(&self, user_id: Uuid, draft: StoryDraft) -> Result<Story, AppError> {
        let story = Story::posted(user_id, draft.validate()?, Utc::now());
        let created = self.stories.insert(&story).await?;
        info!(story_id = %created.id, %user_id, expires_at = %created.expires_at, "Story posted");
        Ok(created)
    }

    /// Only the author can remove a story.
    pub async fn remove(&self, user_id: Uuid, story_id: Uuid) -> Result<(), AppError> {
        let story = self
            .stories
            .get(story_id)
            .await?
            .ok_or_else(|| not_found(story_id))?;
        if story.user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can delete this story".to_string(),
            ));
        }

        if !self.stories.delete(story_id).await? {
            return Err(not_found(story_id));
        }
        info!(%story_id, %user_id, "Story deleted");
        Ok(())
    }
}

fn not_found(story_id: Uuid) -> AppError {
    AppError::NotFound(format!("Story '{}' was not found", story_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStoryStore;
    use chrono::Duration;

    fn draft() -> StoryDraft {
        StoryDraft {
            image_url: "https://img.test/story.jpg".to_string(),
            caption: Some("Sound check".to_string()),
        }
    }

    #[tokio::test]
    async fn test_expired_stories_are_hidden() {
        let store = Arc::new(MemoryStoryStore::new());
        let service = StoryService::new(store.clone());
        let author = Uuid::new_v4();

        let fresh = service.post(author, draft()).await.unwrap();
        let stale = Story::posted(author, draft(), Utc::now() - Duration::hours(25));
        store.seed(stale).await;

        let groups = service.feed(None).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].stories.len(), 1);
        assert_eq!(groups[0].stories[0].id, fresh.id);
    }

    #[tokio::test]
    async fn test_own_group_comes_first() {
        let store = Arc::new(MemoryStoryStore::new());
        let service = StoryService::new(store.clone());
        let (me, other) = (Uuid::new_v4(), Uuid::new_v4());

        let mut mine = Story::posted(me, draft(), Utc::now() - Duration::hours(2));
        mine.caption = None;
        store.seed(mine).await;
        service.post(other, draft()).await.unwrap();

        let groups = service.feed(Some(me)).await.unwrap();
        assert_eq!(groups[0].user_id, me);
        assert!(groups[0].is_own);
        assert_eq!(groups[1].user_id, other);
    }

    #[tokio::test]
    async fn test_only_author_removes() {
        let store = Arc::new(MemoryStoryStore::new());
        let service = StoryService::new(store.clone());
        let author = Uuid::new_v4();
        let story = service.post(author, draft()).await.unwrap();

        let err = service.remove(Uuid::new_v4(), story.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        service.remove(author, story.id).await.unwrap();
        let err = service.remove(author, story.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
