use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::status::EventStatus;
use crate::utils::error::AppError;

/// Record of one applied status change.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationAction {
    pub event_id: Uuid,
    pub status: EventStatus,
    pub reason: Option<String>,
    pub actor_id: Uuid,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BulkFailure {
    pub id: Uuid,
    pub code: String,
    pub message: String,
}

impl BulkFailure {
    pub fn new(id: Uuid, error: &AppError) -> Self {
        Self {
            id,
            code: error.code().to_string(),
            message: error.public_message(),
        }
    }
}

/// Per-id result of a bulk transition. Successful writes are never rolled back.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn affected(&self) -> usize {
        self.succeeded.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
