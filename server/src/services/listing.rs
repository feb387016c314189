use chrono::FixedOffset;
use std::sync::Arc;
use uuid::Uuid;

use crate::filters::{ListingFilter, ListingView};
use crate::models::{Event, EventStatus};
use crate::store::{EventOrder, EventQuery, EventStore};
use crate::utils::error::AppError;

/// Read side of the public pages.
#[derive(Clone)]
pub struct ListingService {
    events: Arc<dyn EventStore>,
}

impl ListingService {
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }

    /// Approved events matching `filter`, soonest first.
    ///
    /// Everything except the calendar-day filter is pushed down to the store;
    /// the day depends on the viewer's offset and is checked here.
    pub async fn public(
        &self,
        filter: &ListingFilter,
        offset: FixedOffset,
    ) -> Result<Vec<Event>, AppError> {
        let query = EventQuery {
            status: Some(EventStatus::Approved),
            category: filter.category.clone(),
            city: filter.city.clone(),
            search: filter.search.clone(),
            geotagged_only: filter.view == ListingView::Map,
            order: EventOrder::StartAscending,
            ..Default::default()
        };

        let rows = self.events.select(&query).await?;
        Ok(rows
            .into_iter()
            .filter(|e| filter.matches(e, offset))
            .collect())
    }

    /// Events behind a set of favorite ids, soonest first.
    pub async fn by_ids(&self, ids: Vec<Uuid>) -> Result<Vec<Event>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.events
            .select(&EventQuery {
                ids: Some(ids),
                order: EventOrder::StartAscending,
                ..Default::default()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{CategoryFilter, CityFilter, TextSearch};
    use crate::models::{EventCategory, EventDraft};
    use crate::store::MemoryEventStore;
    use chrono::{NaiveDate, TimeZone, Utc};

    async fn seed(
        store: &MemoryEventStore,
        title: &str,
        category: EventCategory,
        city: &str,
        day: u32,
        status: EventStatus,
    ) -> Event {
        let mut event = Event::submitted(
            Uuid::new_v4(),
            EventDraft {
                title: title.to_string(),
                description: None,
                category,
                date_start: Utc.with_ymd_and_hms(2026, 3, day, 18, 0, 0).unwrap(),
                date_end: None,
                city: Some(city.to_string()),
                address: None,
                latitude: None,
                longitude: None,
                is_free: true,
                price: None,
                image_url: None,
            },
            Utc::now(),
        );
        event.status = status;
        store.seed(event.clone()).await;
        event
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[tokio::test]
    async fn test_only_approved_events_are_public() {
        let store = Arc::new(MemoryEventStore::new());
        let approved = seed(&store, "Rock", EventCategory::Music, "A", 10, EventStatus::Approved).await;
        seed(&store, "Pop", EventCategory::Music, "A", 11, EventStatus::Pending).await;
        seed(&store, "Folk", EventCategory::Music, "A", 12, EventStatus::Rejected).await;

        let service = ListingService::new(store);
        let rows = service.public(&ListingFilter::default(), utc()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, approved.id);
    }

    #[tokio::test]
    async fn test_filters_combine_and_sort_by_start() {
        let store = Arc::new(MemoryEventStore::new());
        let later = seed(&store, "Rock late", EventCategory::Music, "A", 20, EventStatus::Approved).await;
        let sooner = seed(&store, "Rock early", EventCategory::Music, "A", 5, EventStatus::Approved).await;
        seed(&store, "Rock B", EventCategory::Music, "B", 6, EventStatus::Approved).await;
        seed(&store, "Match", EventCategory::Sport, "A", 7, EventStatus::Approved).await;

        let service = ListingService::new(store);
        let filter = ListingFilter {
            category: CategoryFilter::Only(EventCategory::Music),
            city: CityFilter::Only("A".to_string()),
            search: TextSearch::new("rock", false),
            ..Default::default()
        };
        let ids: Vec<Uuid> = service
            .public(&filter, utc())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![sooner.id, later.id]);
    }

    #[tokio::test]
    async fn test_date_filter() {
        let store = Arc::new(MemoryEventStore::new());
        let on_day = seed(&store, "Gig", EventCategory::Music, "A", 15, EventStatus::Approved).await;
        seed(&store, "Other gig", EventCategory::Music, "A", 16, EventStatus::Approved).await;

        let service = ListingService::new(store);
        let filter = ListingFilter {
            date: NaiveDate::from_ymd_opt(2026, 3, 15),
            ..Default::default()
        };
        let rows = service.public(&filter, utc()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, on_day.id);
    }

    #[tokio::test]
    async fn test_by_ids_skips_store_for_empty_set() {
        let store = Arc::new(MemoryEventStore::new());
        let fav = seed(&store, "Fav", EventCategory::Art, "A", 3, EventStatus::Approved).await;
        seed(&store, "Not fav", EventCategory::Art, "A", 4, EventStatus::Approved).await;

        let service = ListingService::new(store);
        assert!(service.by_ids(Vec::new()).await.unwrap().is_empty());
        let rows = service.by_ids(vec![fav.id]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, fav.id);
    }
}
