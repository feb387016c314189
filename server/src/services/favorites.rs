//! Favorite toggling with an optimistic in-memory mirror.
//!
//! Each signed-in user gets a [`FavoriteSession`] holding the set of event ids
//! they favorited, loaded once from the store. A toggle flips the mirror
//! first, then writes to the store, and applies the inverse op if the write
//! fails. Toggles on the same event are sequenced through a per-event lock;
//! toggles on different events never wait on each other. A reload waits for
//! in-flight toggles to settle so it never reads a half-written state.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::FavoriteOp;
use crate::store::FavoriteStore;
use crate::utils::error::AppError;

pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct FavoriteSession {
    user_id: Uuid,
    store: Arc<dyn FavoriteStore>,
    ids: Mutex<HashSet<Uuid>>,
    /// Shared by toggles, taken exclusively by reloads.
    settle_gate: RwLock<()>,
    in_flight: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl FavoriteSession {
    pub async fn load(store: Arc<dyn FavoriteStore>, user_id: Uuid) -> Result<Self, AppError> {
        let ids = store.select(user_id).await?;
        debug!(%user_id, count = ids.len(), "Loaded favorites");
        Ok(Self {
            user_id,
            store,
            ids: Mutex::new(ids.into_iter().collect()),
            settle_gate: RwLock::new(()),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn is_favorite(&self, event_id: Uuid) -> bool {
        lock(&self.ids).contains(&event_id)
    }

    pub fn ids(&self) -> HashSet<Uuid> {
        lock(&self.ids).clone()
    }

    /// Replace the mirror with the store's current state, once every
    /// in-flight toggle has settled.
    pub async fn reload(&self) -> Result<HashSet<Uuid>, AppError> {
        let _exclusive = self.settle_gate.write().await;
        let ids: HashSet<Uuid> = self.store.select(self.user_id).await?.into_iter().collect();
        *lock(&self.ids) = ids.clone();
        debug!(user_id = %self.user_id, count = ids.len(), "Reloaded favorites");
        Ok(ids)
    }

    /// Flip membership of `event_id`; returns whether it is now a favorite.
    pub async fn toggle(&self, event_id: Uuid) -> Result<bool, AppError> {
        let _shared = self.settle_gate.read().await;
        let slot = self.slot(event_id);
        let result = {
            let _in_flight = slot.lock().await;
            self.toggle_locked(event_id).await
        };
        self.release(event_id, &slot);
        result
    }

    async fn toggle_locked(&self, event_id: Uuid) -> Result<bool, AppError> {
        let op = {
            let mut ids = lock(&self.ids);
            let op = FavoriteOp::toggle(&ids, event_id);
            op.apply(&mut ids);
            op
        };

        let written = match op {
            FavoriteOp::Add(id) => self.store.insert(self.user_id, id).await,
            FavoriteOp::Remove(id) => self.store.delete(self.user_id, id).await,
        };

        match written {
            Ok(()) => Ok(matches!(op, FavoriteOp::Add(_))),
            Err(e) => {
                op.invert().apply(&mut lock(&self.ids));
                warn!(user_id = %self.user_id, %event_id, op = ?op, error = %e, "Favorite write failed, reverted");
                Err(e)
            }
        }
    }

    fn slot(&self, event_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        lock(&self.in_flight)
            .entry(event_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop the per-event lock once nobody else is queued on it.
    fn release(&self, event_id: Uuid, slot: &Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = lock(&self.in_flight);
        // One reference in the map, one held by the caller.
        if Arc::strong_count(slot) <= 2 {
            in_flight.remove(&event_id);
        }
    }

    #[cfg(test)]
    fn pending_slots(&self) -> usize {
        lock(&self.in_flight).len()
    }
}

struct SessionEntry {
    session: Arc<FavoriteSession>,
    last_used: Instant,
}

/// Favorite sessions of every signed-in user.
///
/// A session idle for longer than `idle_ttl` is dropped on the next access
/// to the registry and loaded again from the store when its user returns.
pub struct Favorites {
    store: Arc<dyn FavoriteStore>,
    idle_ttl: Duration,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl Favorites {
    pub fn new(store: Arc<dyn FavoriteStore>) -> Self {
        Self::with_idle_ttl(store, DEFAULT_IDLE_TTL)
    }

    pub fn with_idle_ttl(store: Arc<dyn FavoriteStore>, idle_ttl: Duration) -> Self {
        Self {
            store,
            idle_ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Session of the caller, loading it on first use.
    pub async fn session(&self, user_id: Option<Uuid>) -> Result<Arc<FavoriteSession>, AppError> {
        let user_id = user_id.ok_or_else(|| {
            AppError::Unauthenticated("Sign in to save events to favorites".to_string())
        })?;

        let existing = {
            let mut sessions = lock(&self.sessions);
            self.evict_idle(&mut sessions, Instant::now());
            sessions.get_mut(&user_id).map(|entry| {
                entry.last_used = Instant::now();
                entry.session.clone()
            })
        };
        if let Some(session) = existing {
            return Ok(session);
        }

        let loaded = Arc::new(FavoriteSession::load(self.store.clone(), user_id).await?);
        let mut sessions = lock(&self.sessions);
        let entry = sessions.entry(user_id).or_insert(SessionEntry {
            session: loaded,
            last_used: Instant::now(),
        });
        entry.last_used = Instant::now();
        Ok(entry.session.clone())
    }

    /// Sessions still referenced elsewhere are in use and stay.
    fn evict_idle(&self, sessions: &mut HashMap<Uuid, SessionEntry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| {
            now.duration_since(entry.last_used) <= self.idle_ttl
                || Arc::strong_count(&entry.session) > 1
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "Evicted idle favorite sessions");
        }
    }

    pub async fn toggle(&self, user_id: Option<Uuid>, event_id: Uuid) -> Result<bool, AppError> {
        let session = self.session(user_id).await?;

        // Run to completion even if the caller goes away, so the mirror is
        // never left holding an unconfirmed op.
        let favorited = tokio::spawn(async move { session.toggle(event_id).await })
            .await
            .map_err(|e| AppError::InternalServerError(format!("Favorite toggle aborted: {}", e)))??;

        info!(user_id = ?user_id, %event_id, favorited, "Favorite toggled");
        Ok(favorited)
    }

    pub async fn ids(&self, user_id: Option<Uuid>) -> Result<HashSet<Uuid>, AppError> {
        Ok(self.session(user_id).await?.ids())
    }

    pub async fn reload(&self, user_id: Option<Uuid>) -> Result<HashSet<Uuid>, AppError> {
        self.session(user_id).await?.reload().await
    }

    /// Forget the caller's mirror. Returns whether a session existed.
    pub fn sign_out(&self, user_id: Uuid) -> bool {
        lock(&self.sessions).remove(&user_id).is_some()
    }

    #[cfg(test)]
    fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FavoriteCall, MemoryFavoriteStore};
    use std::time::Duration;

    fn setup() -> (Arc<MemoryFavoriteStore>, Favorites, Uuid) {
        let store = Arc::new(MemoryFavoriteStore::new());
        let favorites = Favorites::new(store.clone());
        (store, favorites, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_toggle_twice_round_trips() {
        let (store, favorites, user) = setup();
        let event = Uuid::new_v4();

        assert!(favorites.toggle(Some(user), event).await.unwrap());
        assert!(favorites.ids(Some(user)).await.unwrap().contains(&event));
        assert!(!favorites.toggle(Some(user), event).await.unwrap());
        assert!(favorites.ids(Some(user)).await.unwrap().is_empty());

        assert_eq!(
            store.calls().await,
            vec![
                FavoriteCall::Select(user),
                FavoriteCall::Insert(user, event),
                FavoriteCall::Delete(user, event),
            ]
        );
        assert!(!store.contains(user, event).await);
    }

    #[tokio::test]
    async fn test_failed_insert_reverts_membership() {
        let (store, favorites, user) = setup();
        let event = Uuid::new_v4();
        store.set_fail_inserts(true).await;

        let err = favorites.toggle(Some(user), event).await.unwrap_err();
        assert!(matches!(err, AppError::StoreError(_)));
        assert!(!favorites.ids(Some(user)).await.unwrap().contains(&event));
    }

    #[tokio::test]
    async fn test_failed_delete_puts_event_back() {
        let (store, favorites, user) = setup();
        let kept = Uuid::new_v4();
        let event = Uuid::new_v4();
        store.seed(user, kept).await;
        store.seed(user, event).await;
        store.set_fail_deletes(true).await;

        assert!(favorites.toggle(Some(user), event).await.is_err());

        let ids = favorites.ids(Some(user)).await.unwrap();
        assert_eq!(ids, [kept, event].into_iter().collect());
    }

    #[tokio::test]
    async fn test_anonymous_toggle_touches_nothing() {
        let (store, favorites, _) = setup();

        let err = favorites.toggle(None, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_toggles_on_one_event_are_sequenced() {
        let (store, favorites, user) = setup();
        let event = Uuid::new_v4();
        store.set_latency(Some(Duration::from_millis(20))).await;
        let session = favorites.session(Some(user)).await.unwrap();

        let (first, second) = tokio::join!(session.toggle(event), session.toggle(event));

        assert!(first.unwrap());
        assert!(!second.unwrap());
        assert_eq!(
            store.calls().await,
            vec![
                FavoriteCall::Select(user),
                FavoriteCall::Insert(user, event),
                FavoriteCall::Delete(user, event),
            ]
        );
        assert!(!session.is_favorite(event));
        assert_eq!(session.pending_slots(), 0);
    }

    #[tokio::test]
    async fn test_stuck_toggle_does_not_block_other_events() {
        let (_, favorites, user) = setup();
        let session = favorites.session(Some(user)).await.unwrap();
        let (stuck, free) = (Uuid::new_v4(), Uuid::new_v4());

        let slot = session.slot(stuck);
        let _held = slot.lock().await;

        let blocked = tokio::time::timeout(Duration::from_millis(20), session.toggle(stuck)).await;
        assert!(blocked.is_err());

        let other = tokio::time::timeout(Duration::from_secs(1), session.toggle(free))
            .await
            .expect("toggle on another event must not wait");
        assert!(other.unwrap());
        assert!(session.is_favorite(free));
        assert!(!session.is_favorite(stuck));
    }

    #[tokio::test]
    async fn test_session_loads_once() {
        let (store, favorites, user) = setup();
        let event = Uuid::new_v4();
        store.seed(user, event).await;

        assert!(favorites.session(Some(user)).await.unwrap().is_favorite(event));
        favorites.ids(Some(user)).await.unwrap();

        assert_eq!(store.calls().await, vec![FavoriteCall::Select(user)]);
    }

    #[tokio::test]
    async fn test_sign_out_drops_mirror() {
        let (store, favorites, user) = setup();
        let event = Uuid::new_v4();
        favorites.toggle(Some(user), event).await.unwrap();

        assert!(favorites.sign_out(user));
        assert!(!favorites.sign_out(user));

        // Next access loads again from the store.
        assert!(favorites.ids(Some(user)).await.unwrap().contains(&event));
        let selects = store
            .calls()
            .await
            .into_iter()
            .filter(|c| matches!(c, FavoriteCall::Select(_)))
            .count();
        assert_eq!(selects, 2);
    }

    #[tokio::test]
    async fn test_failed_toggle_after_reload_keeps_reloaded_state() {
        let (store, favorites, user) = setup();
        let event = Uuid::new_v4();
        store.set_latency(Some(Duration::from_millis(30))).await;
        store.set_fail_inserts(true).await;
        let session = favorites.session(Some(user)).await.unwrap();

        let toggling = session.toggle(event);
        let reloading = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            store.seed(user, event).await;
            session.reload().await.unwrap();
        };
        let (result, ()) = tokio::join!(toggling, reloading);

        assert!(result.is_err());
        // The reload saw the event in the store; the revert must not remove it.
        assert!(session.is_favorite(event));
    }

    #[tokio::test]
    async fn test_reload_during_successful_toggle_keeps_mirror_in_sync() {
        let (store, favorites, user) = setup();
        let event = Uuid::new_v4();
        store.set_latency(Some(Duration::from_millis(30))).await;
        let session = favorites.session(Some(user)).await.unwrap();

        let toggling = session.toggle(event);
        let reloading = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            session.reload().await.unwrap()
        };
        let (result, reloaded) = tokio::join!(toggling, reloading);

        assert!(result.unwrap());
        assert!(reloaded.contains(&event));
        assert!(store.contains(user, event).await);
        assert!(session.is_favorite(event));

        // Next toggle removes instead of inserting a duplicate.
        assert!(!session.toggle(event).await.unwrap());
        assert!(!store.contains(user, event).await);
        assert!(!session.is_favorite(event));
    }

    #[tokio::test]
    async fn test_reload_picks_up_store_changes() {
        let (store, favorites, user) = setup();
        let event = Uuid::new_v4();
        favorites.session(Some(user)).await.unwrap();
        store.seed(user, event).await;

        assert!(!favorites.ids(Some(user)).await.unwrap().contains(&event));
        assert!(favorites.reload(Some(user)).await.unwrap().contains(&event));
        assert!(favorites.ids(Some(user)).await.unwrap().contains(&event));
    }

    #[tokio::test]
    async fn test_idle_session_is_evicted_and_reloaded() {
        let store = Arc::new(MemoryFavoriteStore::new());
        let favorites = Favorites::with_idle_ttl(store.clone(), Duration::from_millis(10));
        let (idle, active) = (Uuid::new_v4(), Uuid::new_v4());
        let event = Uuid::new_v4();

        favorites.session(Some(idle)).await.unwrap();
        let held = favorites.session(Some(active)).await.unwrap();
        assert_eq!(favorites.session_count(), 2);

        tokio::time::sleep(Duration::from_millis(30)).await;
        store.seed(idle, event).await;

        // Any access sweeps; the session still held by a caller survives.
        favorites.session(Some(held.user_id())).await.unwrap();
        assert_eq!(favorites.session_count(), 1);

        assert!(favorites.ids(Some(idle)).await.unwrap().contains(&event));
        let selects = store
            .calls()
            .await
            .into_iter()
            .filter(|c| *c == FavoriteCall::Select(idle))
            .count();
        assert_eq!(selects, 2);
    }

    #[tokio::test]
    async fn test_recent_session_is_kept() {
        let (store, favorites, user) = setup();
        favorites.session(Some(user)).await.unwrap();
        favorites.session(Some(Uuid::new_v4())).await.unwrap();

        assert_eq!(favorites.session_count(), 2);
        favorites.ids(Some(user)).await.unwrap();
        let selects = store
            .calls()
            .await
            .into_iter()
            .filter(|c| *c == FavoriteCall::Select(user))
            .count();
        assert_eq!(selects, 1);
    }
}
