//! # Paged View
//!
//! Mediates between a paginated `RecordSource` and the selection.
//!
//! ## Ordering
//!
//! Every fetch is tagged with a monotonic token taken when the request is
//! issued. When the response resolves, it is applied only if its token is
//! still the newest one; otherwise it is dropped and a
//! `BrowseEvent::StaleResponseDiscarded` is emitted. The state lock is never
//! held across the fetch, so a newer request can be issued while an older one
//! is pending.
//!
//! ## Failures
//!
//! Fetch failures are recorded in `last_error`. The view then renders an empty
//! page with an unknown total, so the workflow cannot be wedged by a transient
//! failure.

use crate::pagination::PageRequest;
use crate::selection::SelectionSet;
use bridge_traits::{CollectionId, Record, RecordId, RecordSource};
use core_runtime::config::WorkflowSettings;
use core_runtime::events::{BrowseEvent, CoreEvent, EventBus};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// How a fetch call resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was applied to the view
    Applied,
    /// A newer request was issued first; the response was dropped
    Stale,
    /// The fetch failed; the view shows an empty page
    Failed,
    /// The window did not change; nothing was fetched
    Unchanged,
    /// No collection is selected yet
    Idle,
}

/// Renderable state of the view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSnapshot {
    pub collection_id: Option<CollectionId>,
    pub records: Vec<Record>,
    /// `None` until the first response for the current collection arrives
    pub total: Option<u64>,
    pub offset: u32,
    pub page_size: u32,
    pub loading: bool,
    pub last_error: Option<String>,
    /// False for the review listing, which disables pagination controls
    pub paginated: bool,
}

impl PageSnapshot {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_offset(self.offset, self.page_size)
    }

    pub fn page_count(&self) -> Option<u32> {
        self.page_request().page_count(self.total)
    }

    pub fn has_next(&self) -> bool {
        self.paginated && self.page_request().has_next(self.total)
    }

    pub fn has_previous(&self) -> bool {
        self.paginated && self.page_request().has_previous()
    }
}

/// The rows checked on the loaded page, resolved against that page only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    /// Collection the page was loaded from
    pub collection_id: Option<CollectionId>,
    /// Ids of every row on the loaded page
    pub page_ids: Vec<RecordId>,
    /// Checked rows, in page order
    pub checked: Vec<Record>,
}

impl PageSelection {
    pub fn is_on_page(&self, id: RecordId) -> bool {
        self.page_ids.contains(&id)
    }
}

#[derive(Debug)]
struct ViewState {
    collection_id: Option<CollectionId>,
    offset: u32,
    page_size: u32,
    records: Vec<Record>,
    total: Option<u64>,
    loading: bool,
    last_error: Option<String>,
    latest_token: u64,
}

struct Ticket {
    token: u64,
    collection_id: CollectionId,
    offset: u32,
    page_size: u32,
}

/// Paginated browse view over one collection at a time
pub struct PagedView {
    source: Arc<dyn RecordSource>,
    event_bus: EventBus,
    max_page_size: u32,
    state: Mutex<ViewState>,
}

impl PagedView {
    pub fn new(
        source: Arc<dyn RecordSource>,
        event_bus: EventBus,
        settings: &WorkflowSettings,
    ) -> Self {
        Self {
            source,
            event_bus,
            max_page_size: settings.max_page_size.max(1),
            state: Mutex::new(ViewState {
                collection_id: None,
                offset: 0,
                page_size: settings.page_size.clamp(1, settings.max_page_size.max(1)),
                records: Vec::new(),
                total: None,
                loading: false,
                last_error: None,
                latest_token: 0,
            }),
        }
    }

    /// Browse another collection, restarting at page one
    #[instrument(skip(self), fields(collection_id = %collection_id))]
    pub async fn set_collection(&self, collection_id: CollectionId) -> FetchOutcome {
        {
            let mut state = self.state.lock().await;
            if state.collection_id.as_ref() == Some(&collection_id) {
                return FetchOutcome::Unchanged;
            }
            state.collection_id = Some(collection_id);
            state.offset = 0;
            state.records.clear();
            state.total = None;
            state.last_error = None;
        }
        self.fetch().await
    }

    /// Jump to a 0-indexed page
    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        let page_size = self.state.lock().await.page_size;
        let offset = PageRequest::new(page, page_size).offset();
        self.set_window(offset, page_size).await
    }

    /// Change offset and page size. The page size is clamped to `1..=max`.
    pub async fn set_window(&self, offset: u32, page_size: u32) -> FetchOutcome {
        let page_size = page_size.clamp(1, self.max_page_size);
        {
            let mut state = self.state.lock().await;
            if state.offset == offset && state.page_size == page_size {
                return FetchOutcome::Unchanged;
            }
            state.offset = offset;
            state.page_size = page_size;
        }
        self.fetch().await
    }

    /// Re-fetch the current window
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch().await
    }

    pub async fn snapshot(&self) -> PageSnapshot {
        let state = self.state.lock().await;
        PageSnapshot {
            collection_id: state.collection_id.clone(),
            records: state.records.clone(),
            total: state.total,
            offset: state.offset,
            page_size: state.page_size,
            loading: state.loading,
            last_error: state.last_error.clone(),
            paginated: true,
        }
    }

    /// Resolve the checked row ids against the loaded page.
    ///
    /// Ids that are not on the loaded page are ignored.
    pub async fn select_on_page(&self, checked_ids: &[RecordId]) -> PageSelection {
        let state = self.state.lock().await;
        let checked: HashSet<RecordId> = checked_ids.iter().copied().collect();
        PageSelection {
            collection_id: state.collection_id.clone(),
            page_ids: state.records.iter().map(|record| record.id).collect(),
            checked: state
                .records
                .iter()
                .filter(|record| checked.contains(&record.id))
                .cloned()
                .collect(),
        }
    }

    /// Review listing: the whole selection as one client-side page
    pub fn review_snapshot(selection: &SelectionSet) -> PageSnapshot {
        let records = selection.list().to_vec();
        let len = records.len();
        PageSnapshot {
            collection_id: None,
            records,
            total: Some(len as u64),
            offset: 0,
            page_size: u32::try_from(len).unwrap_or(u32::MAX),
            loading: false,
            last_error: None,
            paginated: false,
        }
    }

    async fn issue(&self) -> Option<Ticket> {
        let mut state = self.state.lock().await;
        let collection_id = state.collection_id.clone()?;
        state.latest_token += 1;
        state.loading = true;
        Some(Ticket {
            token: state.latest_token,
            collection_id,
            offset: state.offset,
            page_size: state.page_size,
        })
    }

    async fn fetch(&self) -> FetchOutcome {
        let Some(ticket) = self.issue().await else {
            return FetchOutcome::Idle;
        };

        debug!(
            collection_id = %ticket.collection_id,
            offset = ticket.offset,
            page_size = ticket.page_size,
            token = ticket.token,
            "Fetching page"
        );
        self.event_bus
            .emit(CoreEvent::Browse(BrowseEvent::PageRequested {
                collection_id: ticket.collection_id.to_string(),
                offset: ticket.offset,
                page_size: ticket.page_size,
                token: ticket.token,
            }))
            .ok();

        let result = self
            .source
            .list_records(&ticket.collection_id, ticket.offset, ticket.page_size)
            .await;

        let mut state = self.state.lock().await;
        if ticket.token != state.latest_token {
            debug!(
                token = ticket.token,
                latest_token = state.latest_token,
                "Discarding stale page response"
            );
            self.event_bus
                .emit(CoreEvent::Browse(BrowseEvent::StaleResponseDiscarded {
                    collection_id: ticket.collection_id.to_string(),
                    token: ticket.token,
                    latest_token: state.latest_token,
                }))
                .ok();
            return FetchOutcome::Stale;
        }

        state.loading = false;
        match result {
            Ok(page) => {
                let records = page.records.len();
                state.records = page.records;
                state.total = Some(page.total);
                state.last_error = None;

                self.event_bus
                    .emit(CoreEvent::Browse(BrowseEvent::PageLoaded {
                        collection_id: ticket.collection_id.to_string(),
                        offset: ticket.offset,
                        records,
                        total: page.total,
                        token: ticket.token,
                    }))
                    .ok();
                FetchOutcome::Applied
            }
            Err(e) => {
                warn!(
                    collection_id = %ticket.collection_id,
                    error = %e,
                    "Page fetch failed"
                );
                state.records.clear();
                state.total = None;
                state.last_error = Some(e.to_string());

                self.event_bus
                    .emit(CoreEvent::Browse(BrowseEvent::PageFailed {
                        collection_id: ticket.collection_id.to_string(),
                        token: ticket.token,
                        message: e.to_string(),
                    }))
                    .ok();
                FetchOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::RecordPage;
    use mockall::mock;
    use mockall::predicate::*;

    mock! {
        Source {}

        #[async_trait]
        impl RecordSource for Source {
            async fn list_records(
                &self,
                collection_id: &CollectionId,
                offset: u32,
                limit: u32,
            ) -> BridgeResult<RecordPage>;
        }
    }

    fn page(ids: &[RecordId], total: u64) -> RecordPage {
        RecordPage {
            records: ids
                .iter()
                .map(|id| Record::new(*id, format!("Company {}", id), false))
                .collect(),
            total,
        }
    }

    fn view(source: MockSource) -> PagedView {
        let settings = WorkflowSettings::default().with_page_size(2);
        PagedView::new(Arc::new(source), EventBus::default(), &settings)
    }

    #[tokio::test]
    async fn test_idle_until_collection_selected() {
        let view = view(MockSource::new());
        assert_eq!(view.refresh().await, FetchOutcome::Idle);

        let snapshot = view.snapshot().await;
        assert!(snapshot.records.is_empty());
        assert_eq!(snapshot.total, None);
        assert_eq!(snapshot.page_count(), None);
        assert!(!snapshot.has_next());
    }

    #[tokio::test]
    async fn test_collection_switch_resets_offset() {
        let mut source = MockSource::new();
        source
            .expect_list_records()
            .with(eq(CollectionId::new("a")), eq(0), eq(2))
            .times(1)
            .returning(|_, _, _| Ok(page(&[1, 2], 5)));
        source
            .expect_list_records()
            .with(eq(CollectionId::new("a")), eq(4), eq(2))
            .times(1)
            .returning(|_, _, _| Ok(page(&[5], 5)));
        source
            .expect_list_records()
            .with(eq(CollectionId::new("b")), eq(0), eq(2))
            .times(1)
            .returning(|_, _, _| Ok(page(&[7, 8], 2)));

        let view = view(source);
        assert_eq!(
            view.set_collection(CollectionId::new("a")).await,
            FetchOutcome::Applied
        );
        assert_eq!(view.set_page(2).await, FetchOutcome::Applied);
        assert_eq!(view.snapshot().await.offset, 4);

        assert_eq!(
            view.set_collection(CollectionId::new("b")).await,
            FetchOutcome::Applied
        );
        let snapshot = view.snapshot().await;
        assert_eq!(snapshot.offset, 0);
        assert_eq!(snapshot.total, Some(2));
        assert_eq!(snapshot.records.len(), 2);
    }

    #[tokio::test]
    async fn test_unchanged_window_does_not_fetch() {
        let mut source = MockSource::new();
        source
            .expect_list_records()
            .times(1)
            .returning(|_, _, _| Ok(page(&[1, 2], 2)));

        let view = view(source);
        view.set_collection(CollectionId::new("a")).await;
        assert_eq!(
            view.set_collection(CollectionId::new("a")).await,
            FetchOutcome::Unchanged
        );
        assert_eq!(view.set_page(0).await, FetchOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_failure_renders_empty_page() {
        let mut source = MockSource::new();
        source
            .expect_list_records()
            .returning(|_, _, _| Err(BridgeError::OperationFailed("connection reset".into())));

        let view = view(source);
        let mut events = view.event_bus.subscribe();

        assert_eq!(
            view.set_collection(CollectionId::new("a")).await,
            FetchOutcome::Failed
        );
        let snapshot = view.snapshot().await;
        assert!(snapshot.records.is_empty());
        assert_eq!(snapshot.total, None);
        assert!(!snapshot.loading);
        assert!(snapshot.last_error.unwrap().contains("connection reset"));

        // PageRequested, then PageFailed
        events.recv().await.unwrap();
        match events.recv().await.unwrap() {
            CoreEvent::Browse(BrowseEvent::PageFailed { collection_id, .. }) => {
                assert_eq!(collection_id, "a")
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_page_size_is_clamped() {
        let mut source = MockSource::new();
        source
            .expect_list_records()
            .with(always(), eq(0), eq(2))
            .times(1)
            .returning(|_, _, _| Ok(page(&[], 0)));
        source
            .expect_list_records()
            .with(always(), eq(0), eq(100))
            .times(1)
            .returning(|_, _, _| Ok(page(&[], 0)));

        let view = view(source);
        view.set_collection(CollectionId::new("a")).await;
        view.set_window(0, 10_000).await;
        assert_eq!(view.snapshot().await.page_size, 100);
    }

    #[tokio::test]
    async fn test_select_on_page_ignores_other_pages() {
        let mut source = MockSource::new();
        source
            .expect_list_records()
            .returning(|_, _, _| Ok(page(&[3, 4], 10)));

        let view = view(source);
        view.set_collection(CollectionId::new("a")).await;

        let selection = view.select_on_page(&[4, 9]).await;
        assert_eq!(selection.collection_id, Some(CollectionId::new("a")));
        assert_eq!(selection.page_ids, vec![3, 4]);
        assert_eq!(selection.checked.len(), 1);
        assert_eq!(selection.checked[0].id, 4);
        assert!(selection.is_on_page(3));
        assert!(!selection.is_on_page(9));
    }

    #[test]
    fn test_review_snapshot_is_unpaginated() {
        let mut selection = SelectionSet::new();
        selection.add(vec![
            Record::new(1, "A", false),
            Record::new(2, "B", true),
        ]);

        let snapshot = PagedView::review_snapshot(&selection);
        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.total, Some(2));
        assert!(!snapshot.paginated);
        assert!(!snapshot.has_next());
        assert!(!snapshot.has_previous());
    }
}
