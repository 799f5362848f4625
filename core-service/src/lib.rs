//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided collaborators (collection listing, record
//! paging, the move operation, navigation, time) into the selection-transfer
//! workflow. Desktop apps typically enable the `desktop-shims` feature, which
//! talks to the collections REST API through `bridge-desktop` and
//! `provider-jam-api`. Hosts that keep collections locally enable
//! `local-store` and use the SQLite store from `core-library`.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::Collection;
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use core_workflow::{
    CollectionBrowser, NotificationCenter, PagedView, WorkflowController, WorkflowId,
};
use tracing::info;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    event_bus: EventBus,
    notifications: Arc<NotificationCenter>,
    view: Arc<PagedView>,
    browser: Arc<CollectionBrowser>,
    controller: Arc<WorkflowController>,
}

impl CoreService {
    /// Build every component from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        let settings = &config.settings;

        let event_bus = EventBus::new(settings.event_buffer_size);
        let notifications = Arc::new(NotificationCenter::new(
            config.clock.clone(),
            settings.notification_ttl(),
            event_bus.clone(),
        ));
        let view = Arc::new(PagedView::new(
            config.record_source.clone(),
            event_bus.clone(),
            settings,
        ));
        let browser = Arc::new(CollectionBrowser::new(
            config.collection_source.clone(),
            config.navigator.clone(),
            view.clone(),
            event_bus.clone(),
        ));
        let controller = Arc::new(WorkflowController::new(
            config.collection_source.clone(),
            config.transfer_service.clone(),
            notifications.clone(),
            event_bus.clone(),
        ));

        info!(
            page_size = settings.page_size,
            notification_ttl_ms = settings.notification_ttl_ms,
            "Core service initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            event_bus,
            notifications,
            view,
            browser,
            controller,
        })
    }

    pub fn config(&self) -> Arc<CoreConfig> {
        Arc::clone(&self.config)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Subscribe to every core event
    pub fn events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    pub fn notifications(&self) -> Arc<NotificationCenter> {
        Arc::clone(&self.notifications)
    }

    pub fn view(&self) -> Arc<PagedView> {
        Arc::clone(&self.view)
    }

    pub fn browser(&self) -> Arc<CollectionBrowser> {
        Arc::clone(&self.browser)
    }

    pub fn controller(&self) -> Arc<WorkflowController> {
        Arc::clone(&self.controller)
    }

    /// Load collections and browse the first one
    pub async fn start(&self) -> Result<Vec<Collection>> {
        Ok(self.browser.load().await?)
    }

    /// Open a workflow over the currently browsed collection
    pub async fn open_workflow(&self) -> Result<WorkflowId> {
        let origin = self.browser.current().await.ok_or_else(|| {
            CoreError::InitializationFailed(
                "no collection is being browsed; call start() first".to_string(),
            )
        })?;
        Ok(self.controller.open(origin).await?)
    }
}

/// Convenience bootstrapper for desktop hosts talking to the collections API.
///
/// ```ignore
/// let core = core_service::bootstrap_desktop("http://localhost:8000")?;
/// core.start().await?;
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(base_url: &str) -> Result<CoreService> {
    use bridge_desktop::{HistoryNavigator, ReqwestHttpClient};
    use provider_jam_api::JamApiConnector;

    let http_client = ReqwestHttpClient::new()
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    let api = Arc::new(JamApiConnector::new(Arc::new(http_client), base_url));

    let config = CoreConfig::builder()
        .collection_source(api.clone())
        .record_source(api.clone())
        .transfer_service(api)
        .navigator(Arc::new(HistoryNavigator::new()))
        .build()?;

    CoreService::new(config)
}

/// Convenience bootstrapper backed by a local SQLite store.
#[cfg(feature = "local-store")]
pub async fn bootstrap_local(
    database: core_library::db::DatabaseConfig,
) -> Result<(CoreService, Arc<core_library::SqliteCollectionStore>)> {
    let pool = core_library::db::create_pool(database).await?;
    let store = Arc::new(core_library::SqliteCollectionStore::new(pool));

    let config = CoreConfig::builder()
        .collection_source(store.clone())
        .record_source(store.clone())
        .transfer_service(store.clone())
        .build()?;

    Ok((CoreService::new(config)?, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{
        CollectionId, CollectionSource, RecordPage, RecordSource, TransferRequest,
        TransferResult, TransferService,
    };
    use core_runtime::config::WorkflowSettings;

    struct StubApi;

    #[async_trait]
    impl CollectionSource for StubApi {
        async fn list_collections(&self) -> BridgeResult<Vec<Collection>> {
            Ok(vec![
                Collection::new("my-list", "My List"),
                Collection::new("liked", "Liked Companies"),
            ])
        }
    }

    #[async_trait]
    impl RecordSource for StubApi {
        async fn list_records(
            &self,
            _collection_id: &CollectionId,
            _offset: u32,
            _limit: u32,
        ) -> BridgeResult<RecordPage> {
            Ok(RecordPage::default())
        }
    }

    #[async_trait]
    impl TransferService for StubApi {
        async fn move_records(&self, request: &TransferRequest) -> BridgeResult<TransferResult> {
            Ok(TransferResult::new(request.record_ids.len() as u64, 0))
        }
    }

    fn config(settings: WorkflowSettings) -> CoreConfig {
        let api = Arc::new(StubApi);
        CoreConfig::builder()
            .collection_source(api.clone())
            .record_source(api.clone())
            .transfer_service(api)
            .settings(settings)
            .build()
            .unwrap()
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut invalid = config(WorkflowSettings::default());
        invalid.settings.page_size = 0;
        let result = CoreService::new(invalid);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_open_requires_browsed_collection() {
        let core = CoreService::new(config(WorkflowSettings::default())).unwrap();
        assert!(core.open_workflow().await.is_err());

        let collections = core.start().await.unwrap();
        assert_eq!(collections.len(), 2);

        core.open_workflow().await.unwrap();
        let state = core.controller().state().await;
        assert_eq!(state.origin.unwrap().id, CollectionId::new("my-list"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_bootstrap_desktop() {
        assert!(bootstrap_desktop("http://localhost:8000").is_ok());
    }
}
