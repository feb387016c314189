use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::status::{EventStatus, StatusChange};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Music,
    Sport,
    Education,
    Food,
    Art,
    Tech,
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Music => "music",
            EventCategory::Sport => "sport",
            EventCategory::Education => "education",
            EventCategory::Food => "food",
            EventCategory::Art => "art",
            EventCategory::Tech => "tech",
            EventCategory::Other => "other",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "music" => Ok(EventCategory::Music),
            "sport" => Ok(EventCategory::Sport),
            "education" => Ok(EventCategory::Education),
            "food" => Ok(EventCategory::Food),
            "art" => Ok(EventCategory::Art),
            "tech" => Ok(EventCategory::Tech),
            "other" => Ok(EventCategory::Other),
            other => Err(AppError::ValidationError(format!(
                "Unknown category '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: EventCategory,
    pub date_start: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_free: bool,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub status: EventStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Build a freshly submitted event. New events always start in review.
    pub fn submitted(owner_id: Uuid, draft: EventDraft, now: DateTime<Utc>) -> Self {
        let mut event = Self {
            id: Uuid::new_v4(),
            owner_id,
            title: String::new(),
            description: None,
            category: EventCategory::Other,
            date_start: now,
            date_end: None,
            city: None,
            address: None,
            latitude: None,
            longitude: None,
            is_free: true,
            price: None,
            image_url: None,
            status: EventStatus::Pending,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        event.replace_content(draft);
        event
    }

    pub fn replace_content(&mut self, draft: EventDraft) {
        self.title = draft.title;
        self.description = draft.description;
        self.category = draft.category;
        self.date_start = draft.date_start;
        self.date_end = draft.date_end;
        self.city = draft.city;
        self.address = draft.address;
        self.latitude = draft.latitude;
        self.longitude = draft.longitude;
        self.is_free = draft.is_free;
        self.price = draft.price;
        self.image_url = draft.image_url;
    }

    pub fn apply_status(&mut self, change: &StatusChange) {
        self.status = change.status();
        self.rejection_reason = change.rejection_reason().map(str::to_string);
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn is_public(&self) -> bool {
        self.status == EventStatus::Approved
    }
}

/// Owner-supplied event content, used for both submission and edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_category")]
    pub category: EventCategory,
    pub date_start: DateTime<Utc>,
    #[serde(default)]
    pub date_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_category() -> EventCategory {
    EventCategory::Other
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl EventDraft {
    /// Check the draft and return it in canonical form.
    pub fn validate(self) -> Result<Self, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::ValidationError("Title is required".to_string()));
        }

        if let Some(end) = self.date_end {
            if end < self.date_start {
                return Err(AppError::ValidationError(
                    "date_end cannot be earlier than date_start".to_string(),
                ));
            }
        }

        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(AppError::ValidationError(
                        "Coordinates are out of range".to_string(),
                    ));
                }
            }
            (None, None) => {}
            _ => {
                return Err(AppError::ValidationError(
                    "latitude and longitude must be provided together".to_string(),
                ))
            }
        }

        let price = if self.is_free {
            None
        } else {
            if let Some(price) = self.price {
                if price.is_sign_negative() {
                    return Err(AppError::ValidationError(
                        "price cannot be negative".to_string(),
                    ));
                }
            }
            self.price
        };

        Ok(Self {
            title,
            description: blank_to_none(self.description),
            city: blank_to_none(self.city),
            address: blank_to_none(self.address),
            image_url: blank_to_none(self.image_url),
            price,
            ..self
        })
    }
}
