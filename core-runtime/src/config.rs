//! # Core Configuration Module
//!
//! Builder-based configuration for the collections core.
//!
//! ## Overview
//!
//! `CoreConfig` holds every collaborator the core needs plus the tunable
//! workflow settings. The builder fails fast with an actionable message when a
//! required collaborator is missing.
//!
//! ## Required Collaborators
//!
//! - `CollectionSource` - Collection metadata listing
//! - `RecordSource` - Paginated record listing
//! - `TransferService` - Bulk move
//!
//! ## Optional Collaborators (with defaults)
//!
//! - `Navigator` - Location side effects (default: `NullNavigator`)
//! - `Clock` - Time source for notification expiry (default: `SystemClock`)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, WorkflowSettings};
//! use std::sync::Arc;
//!
//! let api = Arc::new(JamApiConnector::new(http_client, "http://localhost:8000"));
//! let config = CoreConfig::builder()
//!     .collection_source(api.clone())
//!     .record_source(api.clone())
//!     .transfer_service(api)
//!     .settings(WorkflowSettings::default().with_page_size(50))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Missing every required collaborator
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required collaborators");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    Clock, CollectionSource, Navigator, NullNavigator, RecordSource, SystemClock,
    TransferService,
};
use std::sync::Arc;
use std::time::Duration;

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Default upper bound on the page size a view may request
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Default lifetime of a transient notification
pub const DEFAULT_NOTIFICATION_TTL_MS: u64 = 6_000;

/// Longest allowed notification lifetime
pub const MAX_NOTIFICATION_TTL_MS: u64 = 60_000;

/// Core configuration.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Collection metadata source (required)
    pub collection_source: Arc<dyn CollectionSource>,

    /// Paginated record source (required)
    pub record_source: Arc<dyn RecordSource>,

    /// Move collaborator (required)
    pub transfer_service: Arc<dyn TransferService>,

    /// Location side-effect sink
    pub navigator: Arc<dyn Navigator>,

    /// Time source
    pub clock: Arc<dyn Clock>,

    /// Workflow tuning
    pub settings: WorkflowSettings,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("collection_source", &"CollectionSource { ... }")
            .field("record_source", &"RecordSource { ... }")
            .field("transfer_service", &"TransferService { ... }")
            .field("navigator", &"Navigator { ... }")
            .field("clock", &"Clock { ... }")
            .field("settings", &self.settings)
            .finish()
    }
}

/// Tunable workflow settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Records per page when browsing
    pub page_size: u32,

    /// Largest page size a caller may request
    pub max_page_size: u32,

    /// How long success/error notifications stay visible
    pub notification_ttl_ms: u64,

    /// Event bus buffer size
    pub event_buffer_size: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            notification_ttl_ms: DEFAULT_NOTIFICATION_TTL_MS,
            event_buffer_size: crate::events::DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl WorkflowSettings {
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub fn with_notification_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.notification_ttl_ms = ttl_ms;
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    /// Validates the settings.
    ///
    /// This checks:
    /// - Page size is > 0 and not above `max_page_size`
    /// - Notification lifetime is > 0 and at most 60 seconds
    /// - Event buffer is non-empty
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config(
                "Page size must be greater than 0".to_string(),
            ));
        }

        if self.page_size > self.max_page_size {
            return Err(Error::Config(format!(
                "Page size {} exceeds maximum of {}",
                self.page_size, self.max_page_size
            )));
        }

        if self.notification_ttl_ms == 0 {
            return Err(Error::Config(
                "Notification TTL must be greater than 0 ms".to_string(),
            ));
        }

        if self.notification_ttl_ms > MAX_NOTIFICATION_TTL_MS {
            return Err(Error::Config(format!(
                "Notification TTL exceeds maximum of {} ms",
                MAX_NOTIFICATION_TTL_MS
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()
    }
}

fn collection_source_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "CollectionSource".to_string(),
        message: "A CollectionSource is required to list collections. \
                 Desktop: use bootstrap_desktop() or inject JamApiConnector. \
                 Local: inject SqliteCollectionStore."
            .to_string(),
    }
}

fn record_source_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "RecordSource".to_string(),
        message: "A RecordSource is required to page through collection records. \
                 Desktop: use bootstrap_desktop() or inject JamApiConnector. \
                 Local: inject SqliteCollectionStore."
            .to_string(),
    }
}

fn transfer_service_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "TransferService".to_string(),
        message: "A TransferService is required to move records between collections. \
                 Desktop: use bootstrap_desktop() or inject JamApiConnector. \
                 Local: inject SqliteCollectionStore."
            .to_string(),
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    collection_source: Option<Arc<dyn CollectionSource>>,
    record_source: Option<Arc<dyn RecordSource>>,
    transfer_service: Option<Arc<dyn TransferService>>,
    navigator: Option<Arc<dyn Navigator>>,
    clock: Option<Arc<dyn Clock>>,
    settings: Option<WorkflowSettings>,
}

impl CoreConfigBuilder {
    /// Sets the collection metadata source.
    pub fn collection_source(mut self, source: Arc<dyn CollectionSource>) -> Self {
        self.collection_source = Some(source);
        self
    }

    /// Sets the paginated record source.
    pub fn record_source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.record_source = Some(source);
        self
    }

    /// Sets the move collaborator.
    pub fn transfer_service(mut self, service: Arc<dyn TransferService>) -> Self {
        self.transfer_service = Some(service);
        self
    }

    /// Sets the navigator receiving `?collection=<id>` locations.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Sets the time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the workflow settings.
    pub fn settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns an error if:
    /// - A required collaborator is missing (`CapabilityMissing`)
    /// - Settings are invalid (`Config`)
    pub fn build(self) -> Result<CoreConfig> {
        let collection_source = self
            .collection_source
            .ok_or_else(collection_source_missing_error)?;
        let record_source = self.record_source.ok_or_else(record_source_missing_error)?;
        let transfer_service = self
            .transfer_service
            .ok_or_else(transfer_service_missing_error)?;

        let config = CoreConfig {
            collection_source,
            record_source,
            transfer_service,
            navigator: self.navigator.unwrap_or_else(|| Arc::new(NullNavigator)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            settings: self.settings.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
