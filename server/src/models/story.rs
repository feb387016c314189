use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

use crate::utils::error::AppError;

/// Stories disappear from the feed this long after posting.
pub const STORY_LIFETIME_HOURS: i64 = 24;
pub const CAPTION_MAX_CHARS: usize = 150;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Story {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Story {
    pub fn posted(user_id: Uuid, draft: StoryDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            image_url: draft.image_url,
            caption: draft.caption,
            created_at: now,
            expires_at: now + Duration::hours(STORY_LIFETIME_HOURS),
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoryDraft {
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

impl StoryDraft {
    pub fn validate(self) -> Result<Self, AppError> {
        let image_url = self.image_url.trim().to_string();
        if image_url.is_empty() {
            return Err(AppError::ValidationError(
                "image_url is required".to_string(),
            ));
        }

        let caption = self.caption.filter(|c| !c.trim().is_empty());
        if let Some(caption) = &caption {
            if caption.chars().count() > CAPTION_MAX_CHARS {
                return Err(AppError::ValidationError(format!(
                    "caption cannot be longer than {} characters",
                    CAPTION_MAX_CHARS
                )));
            }
        }

        Ok(Self { image_url, caption })
    }
}

/// Active stories of one author, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct StoryGroup {
    pub user_id: Uuid,
    pub is_own: bool,
    pub stories: Vec<Story>,
}

/// Group stories by author. The viewer's own group comes first, the rest
/// follow by their newest story.
pub fn group_stories(mut stories: Vec<Story>, viewer: Option<Uuid>) -> Vec<StoryGroup> {
    stories.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut groups: Vec<StoryGroup> = Vec::new();
    for story in stories {
        let slot = *index.entry(story.user_id).or_insert_with(|| {
            groups.push(StoryGroup {
                user_id: story.user_id,
                is_own: viewer == Some(story.user_id),
                stories: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].stories.push(story);
    }

    // Stable: groups were created in newest-story order.
    groups.sort_by_key(|g| !g.is_own);
    groups
}
