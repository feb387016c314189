use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    EventService, Favorites, ListingService, ModerationService, NotificationService, StoryService,
};
use crate::store::{
    EventStore, FavoriteStore, MemoryEventStore, MemoryFavoriteStore, MemoryNotificationStore,
    MemoryRoleStore, MemoryStoryStore, NotificationStore, RoleStore, StoryStore,
};

/// Every backing store the services are built over.
#[derive(Clone)]
pub struct Stores {
    pub events: Arc<dyn EventStore>,
    pub favorites: Arc<dyn FavoriteStore>,
    pub roles: Arc<dyn RoleStore>,
    pub stories: Arc<dyn StoryStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            events: Arc::new(MemoryEventStore::new()),
            favorites: Arc::new(MemoryFavoriteStore::new()),
            roles: Arc::new(MemoryRoleStore::new()),
            stories: Arc::new(MemoryStoryStore::new()),
            notifications: Arc::new(MemoryNotificationStore::new()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub listing: ListingService,
    pub moderation: ModerationService,
    pub favorites: Arc<Favorites>,
    pub stories: StoryService,
    pub notifications: NotificationService,
    pub roles: Arc<dyn RoleStore>,
}

impl AppState {
    pub fn new(stores: Stores, config: &Config) -> Self {
        let notifications = NotificationService::new(stores.notifications);
        Self {
            events: EventService::new(stores.events.clone()),
            listing: ListingService::new(stores.events.clone()),
            moderation: ModerationService::new(stores.events, notifications.clone()),
            favorites: Arc::new(Favorites::with_idle_ttl(
                stores.favorites,
                config.favorite_idle_ttl,
            )),
            stories: StoryService::new(stores.stories),
            notifications,
            roles: stores.roles,
        }
    }

    /// State backed entirely by in-process stores.
    pub fn in_memory(config: &Config) -> Self {
        Self::new(Stores::in_memory(), config)
    }
}
