use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::AppError;

/// Moderation status of an event.
///
/// Every state is reachable from every other one. Status columns are only
/// ever written through a [`StatusChange`], which is produced either by
/// [`EventStatus::transition`] (moderators) or [`StatusChange::resubmitted`]
/// (owner edits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Approved,
    Rejected,
}

impl EventStatus {
    pub const ALL: [EventStatus; 3] = [
        EventStatus::Pending,
        EventStatus::Approved,
        EventStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Approved => "approved",
            EventStatus::Rejected => "rejected",
        }
    }

    /// Resolve a moderator's request to move from `self` to `target`.
    ///
    /// The reason is only kept when the target is `Rejected`, stored as given;
    /// an empty string counts as no reason. Requesting the current status yields
    /// [`StatusUpdate::Unchanged`].
    pub fn transition(self, target: EventStatus, reason: Option<String>) -> StatusUpdate {
        if self == target {
            return StatusUpdate::Unchanged;
        }

        let rejection_reason = match target {
            EventStatus::Rejected => normalize_reason(reason),
            EventStatus::Pending | EventStatus::Approved => None,
        };

        StatusUpdate::Changed(StatusChange {
            status: target,
            rejection_reason,
        })
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(EventStatus::Pending),
            "approved" => Ok(EventStatus::Approved),
            "rejected" => Ok(EventStatus::Rejected),
            other => Err(AppError::InvalidTransition(format!(
                "'{}' is not a valid status, expected one of pending, approved, rejected",
                other
            ))),
        }
    }
}

fn normalize_reason(reason: Option<String>) -> Option<String> {
    reason.filter(|r| !r.is_empty())
}

/// Outcome of resolving a status request against the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Unchanged,
    Changed(StatusChange),
}

/// The pair of columns written together on every status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    status: EventStatus,
    rejection_reason: Option<String>,
}

impl StatusChange {
    /// Status applied when the owner edits an event: back to review, reason cleared.
    pub fn resubmitted() -> Self {
        Self {
            status: EventStatus::Pending,
            rejection_reason: None,
        }
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }
}
