//! Collection browser
//!
//! Loads the collection list and switches the browsed collection. Each switch
//! is reported to the injected `Navigator` as a `?collection=<id>` location and
//! drives `PagedView::set_collection`.

use crate::error::{Result, WorkflowError};
use crate::paged_view::{FetchOutcome, PagedView};
use bridge_traits::{Collection, CollectionId, CollectionSource, Location, Navigator};
use core_runtime::events::{BrowseEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

#[derive(Debug, Default)]
struct BrowserState {
    collections: Vec<Collection>,
    current: Option<CollectionId>,
}

pub struct CollectionBrowser {
    source: Arc<dyn CollectionSource>,
    navigator: Arc<dyn Navigator>,
    view: Arc<PagedView>,
    event_bus: EventBus,
    state: Mutex<BrowserState>,
}

impl CollectionBrowser {
    pub fn new(
        source: Arc<dyn CollectionSource>,
        navigator: Arc<dyn Navigator>,
        view: Arc<PagedView>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            source,
            navigator,
            view,
            event_bus,
            state: Mutex::new(BrowserState::default()),
        }
    }

    /// Load the collection list.
    ///
    /// When nothing is browsed yet, or the browsed collection disappeared,
    /// the first collection is selected.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Fetch` if the list cannot be loaded
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<Collection>> {
        let collections = self
            .source
            .list_collections()
            .await
            .map_err(|e| WorkflowError::Fetch(e.to_string()))?;

        let default = {
            let mut state = self.state.lock().await;
            state.collections = collections.clone();
            let still_listed = state
                .current
                .as_ref()
                .is_some_and(|id| collections.iter().any(|c| &c.id == id));
            if still_listed {
                None
            } else {
                state.current = None;
                collections.first().map(|c| c.id.clone())
            }
        };

        info!(count = collections.len(), "Collections loaded");
        self.event_bus
            .emit(CoreEvent::Browse(BrowseEvent::CollectionsLoaded {
                count: collections.len(),
            }))
            .ok();

        if let Some(id) = default {
            self.select(&id).await?;
        }
        Ok(collections)
    }

    /// Browse `id`
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::UnknownCollection` if `id` is not in the
    /// loaded list
    #[instrument(skip(self), fields(collection_id = %id))]
    pub async fn select(&self, id: &CollectionId) -> Result<FetchOutcome> {
        {
            let mut state = self.state.lock().await;
            if !state.collections.iter().any(|c| &c.id == id) {
                return Err(WorkflowError::UnknownCollection(id.clone()));
            }
            state.current = Some(id.clone());
        }

        if let Err(e) = self.navigator.navigate(&Location::collection(id.clone())) {
            warn!(error = %e, "Navigator rejected location");
        }
        self.event_bus
            .emit(CoreEvent::Browse(BrowseEvent::CollectionSelected {
                collection_id: id.to_string(),
            }))
            .ok();

        Ok(self.view.set_collection(id.clone()).await)
    }

    pub async fn collections(&self) -> Vec<Collection> {
        self.state.lock().await.collections.clone()
    }

    /// The browsed collection
    pub async fn current(&self) -> Option<Collection> {
        let state = self.state.lock().await;
        let id = state.current.as_ref()?;
        state.collections.iter().find(|c| &c.id == id).cloned()
    }

    pub fn view(&self) -> Arc<PagedView> {
        self.view.clone()
    }
}
