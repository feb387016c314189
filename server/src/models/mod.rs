pub mod event;
pub mod favorite;
pub mod moderation;
pub mod notification;
pub mod status;
pub mod story;
pub mod user;

pub use event::{Event, EventCategory, EventDraft};
pub use favorite::FavoriteOp;
pub use moderation::{BulkFailure, BulkOutcome, ModerationAction};
pub use notification::{Notification, NotificationFeed, NotificationKind};
pub use status::{EventStatus, StatusChange, StatusUpdate};
pub use story::{group_stories, Story, StoryDraft, StoryGroup};
pub use user::{Role, RoleSummary};
