//! # Host Bridge Traits
//!
//! Collaborator contracts between the collections workflow core and the
//! outside world.
//!
//! ## Overview
//!
//! The core never talks to a network or a database directly. Everything it
//! needs from outside is expressed as a trait in this crate and injected at
//! construction time, so the same core runs against a REST backend, a local
//! SQLite store, or test fakes.
//!
//! ## Traits
//!
//! ### Collections
//! - [`CollectionSource`](collections::CollectionSource) - List collection metadata
//! - [`RecordSource`](collections::RecordSource) - Paginated record listing
//! - [`TransferService`](collections::TransferService) - Bulk, idempotent move
//!
//! ### Host Integration
//! - [`Navigator`](navigation::Navigator) - Reflect the browsed collection in the host location
//! - [`HttpClient`](http::HttpClient) - Async HTTP for REST collaborators
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required collaborator is missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let transfer_service = builder.transfer_service
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "TransferService".to_string(),
//!         message: "No transfer service provided. \
//!                  Desktop: use bootstrap_desktop(). \
//!                  Local: inject SqliteCollectionStore.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map "not found" and "refused" answers onto `NotFound` / `Rejected`
//! and reserve `OperationFailed` for transport problems, because the workflow
//! classifies transfer failures from that distinction.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so collaborators can be shared as
//! `Arc<dyn Trait>` across async tasks.

pub mod collections;
pub mod error;
pub mod http;
pub mod navigation;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use collections::{
    Collection, CollectionId, CollectionSource, Record, RecordId, RecordPage, RecordSource,
    TransferRequest, TransferResult, TransferService,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use navigation::{Location, Navigator, NullNavigator};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, SystemClock};
