pub mod events;
pub mod favorites;
pub mod listing;
pub mod moderation;
pub mod notifications;
pub mod stories;

pub use events::{EventService, Viewer};
pub use favorites::{FavoriteSession, Favorites};
pub use listing::ListingService;
pub use moderation::{ModerationFilter, ModerationParams, ModerationService};
pub use notifications::NotificationService;
pub use stories::StoryService;
