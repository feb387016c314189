use std::collections::HashSet;
use uuid::Uuid;

/// One optimistic change to a user's favorite set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteOp {
    Add(Uuid),
    Remove(Uuid),
}

impl FavoriteOp {
    /// The op that flips the current membership of `event_id`.
    pub fn toggle(ids: &HashSet<Uuid>, event_id: Uuid) -> Self {
        if ids.contains(&event_id) {
            FavoriteOp::Remove(event_id)
        } else {
            FavoriteOp::Add(event_id)
        }
    }

    pub fn apply(self, ids: &mut HashSet<Uuid>) {
        match self {
            FavoriteOp::Add(id) => {
                ids.insert(id);
            }
            FavoriteOp::Remove(id) => {
                ids.remove(&id);
            }
        }
    }

    pub fn invert(self) -> Self {
        match self {
            FavoriteOp::Add(id) => FavoriteOp::Remove(id),
            FavoriteOp::Remove(id) => FavoriteOp::Add(id),
        }
    }

    pub fn event_id(self) -> Uuid {
        match self {
            FavoriteOp::Add(id) | FavoriteOp::Remove(id) => id,
        }
    }
}
