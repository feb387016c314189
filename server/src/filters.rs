//! Listing predicates.
//!
//! Every filter here is a pure function over an [`Event`]. Active filters are
//! AND-combined; an inactive filter passes everything through. The postgres
//! store pushes the same predicates down into SQL, the in-memory store and the
//! listing service evaluate them directly.

use chrono::{FixedOffset, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeSet;

use crate::models::{Event, EventCategory};
use crate::utils::error::AppError;

const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(EventCategory),
    /// Multi-select used by the map page.
    AnyOf(BTreeSet<EventCategory>),
}

impl CategoryFilter {
    pub fn matches(&self, category: EventCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
            CategoryFilter::AnyOf(set) => set.contains(&category),
        }
    }

    /// Categories to restrict a store query to, `None` when unrestricted.
    pub fn as_list(&self) -> Option<Vec<EventCategory>> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(c) => Some(vec![*c]),
            CategoryFilter::AnyOf(set) => Some(set.iter().copied().collect()),
        }
    }

    /// Parses `all`, a single category, or a comma separated list.
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let raw = match raw.map(str::trim) {
            None | Some("") | Some(ALL) => return Ok(CategoryFilter::All),
            Some(raw) => raw,
        };

        let mut set = BTreeSet::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            set.insert(part.parse::<EventCategory>()?);
        }

        if set.len() > 1 {
            return Ok(CategoryFilter::AnyOf(set));
        }
        Ok(match set.into_iter().next() {
            Some(category) => CategoryFilter::Only(category),
            None => CategoryFilter::All,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CityFilter {
    #[default]
    All,
    Only(String),
}

impl CityFilter {
    pub fn matches(&self, city: Option<&str>) -> bool {
        match self {
            CityFilter::All => true,
            CityFilter::Only(wanted) => city == Some(wanted.as_str()),
        }
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            CityFilter::All => None,
            CityFilter::Only(city) => Some(city),
        }
    }

    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some(ALL) => CityFilter::All,
            Some(city) => CityFilter::Only(city.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingView {
    #[default]
    List,
    /// Map view: only geotagged events, and search also looks at the city.
    Map,
}

/// Case-insensitive substring search. An empty needle matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextSearch {
    needle: String,
    include_city: bool,
}

impl TextSearch {
    pub fn new(query: &str, include_city: bool) -> Self {
        Self {
            needle: query.trim().to_lowercase(),
            include_city,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn include_city(&self) -> bool {
        self.include_city
    }

    pub fn matches(&self, event: &Event) -> bool {
        if self.needle.is_empty() {
            return true;
        }

        let hit = |field: Option<&str>| {
            field
                .map(|v| v.to_lowercase().contains(&self.needle))
                .unwrap_or(false)
        };

        hit(Some(&event.title))
            || hit(event.description.as_deref())
            || (self.include_city && hit(event.city.as_deref()))
    }
}

pub fn date_matches(date: Option<NaiveDate>, event: &Event, offset: FixedOffset) -> bool {
    match date {
        None => true,
        Some(day) => event.date_start.with_timezone(&offset).date_naive() == day,
    }
}

/// Filters of the public listing and map pages.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub category: CategoryFilter,
    pub city: CityFilter,
    pub date: Option<NaiveDate>,
    pub search: TextSearch,
    pub view: ListingView,
}

impl ListingFilter {
    pub fn matches(&self, event: &Event, offset: FixedOffset) -> bool {
        self.category.matches(event.category)
            && self.city.matches(event.city.as_deref())
            && date_matches(self.date, event, offset)
            && self.search.matches(event)
            && (self.view != ListingView::Map || event.has_coordinates())
    }
}

/// Raw query string of `GET /api/events`.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub category: Option<String>,
    pub city: Option<String>,
    pub date: Option<NaiveDate>,
    pub q: Option<String>,
    pub view: Option<ListingView>,
    /// Viewer's offset from UTC in minutes, east positive.
    pub tz_offset: Option<i32>,
}

impl ListingParams {
    pub fn into_filter(self) -> Result<(ListingFilter, FixedOffset), AppError> {
        let view = self.view.unwrap_or_default();
        let offset = viewer_offset(self.tz_offset)?;
        let filter = ListingFilter {
            category: CategoryFilter::parse(self.category.as_deref())?,
            city: CityFilter::parse(self.city.as_deref()),
            date: self.date,
            search: TextSearch::new(
                self.q.as_deref().unwrap_or_default(),
                view == ListingView::Map,
            ),
            view,
        };
        Ok((filter, offset))
    }
}

pub fn viewer_offset(minutes: Option<i32>) -> Result<FixedOffset, AppError> {
    let minutes = minutes.unwrap_or(0);
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| AppError::ValidationError(format!("Invalid tz_offset {}", minutes)))
}
