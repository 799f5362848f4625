//! # Event Bus System
//!
//! Event-driven plumbing for the collections core, built on
//! `tokio::sync::broadcast`. Components publish typed events; hosts and
//! other components subscribe independently.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │  PagedView   ├──────────────>│           │
//! └──────────────┘               │           │
//!                                │ EventBus  │
//! ┌──────────────┐     emit      │ (broadcast│     subscribe    ┌────────────┐
//! │  Workflow    ├──────────────>│  channel) ├─────────────────>│ Host UI    │
//! └──────────────┘               │           │                  └────────────┘
//!                                │           │
//! ┌──────────────┐     emit      │           │     subscribe    ┌────────────┐
//! │ Notifications├──────────────>│           ├─────────────────>│ Telemetry  │
//! └──────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, BrowseEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Browse(BrowseEvent::CollectionSelected {
//!         collection_id: "c1".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "Collection selected");
//! # }
//! ```
//!
//! ## Event Types
//!
//! ### Browse Events
//! - `CollectionsLoaded`, `CollectionSelected`
//! - `PageRequested`, `PageLoaded`, `PageFailed`
//! - `StaleResponseDiscarded`: a page response arrived after a newer request
//!   had been issued and was dropped
//!
//! ### Workflow Events
//! - `Opened`, `SelectionChanged`, `DestinationChosen`, `StageChanged`, `Closed`
//!
//! ### Transfer Events
//! - `Started`, `Completed`, `Failed`
//! - `Discarded`: a transfer finished after its workflow was torn down
//!
//! ### Notification Events
//! - `Shown`, `Dismissed`
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber was too slow and missed `n`
//!   events. Non-fatal.
//! - **`RecvError::Closed`**: all senders have been dropped. Treat as shutdown.
//!
//! Emitting with no subscribers returns `Err`; publishers call `.ok()` on the
//! result because nobody listening is not a failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Collection browsing and page loading
    Browse(BrowseEvent),
    /// Workflow lifecycle and stage changes
    Workflow(WorkflowEvent),
    /// Transfer execution
    Transfer(TransferEvent),
    /// Transient user notifications
    Notification(NotificationEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Browse(e) => e.description(),
            CoreEvent::Workflow(e) => e.description(),
            CoreEvent::Transfer(e) => e.description(),
            CoreEvent::Notification(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Browse(BrowseEvent::PageFailed { .. }) => EventSeverity::Error,
            CoreEvent::Transfer(TransferEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Browse(BrowseEvent::StaleResponseDiscarded { .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Transfer(TransferEvent::Discarded { .. }) => EventSeverity::Warning,
            CoreEvent::Transfer(TransferEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Workflow(WorkflowEvent::Opened { .. })
            | CoreEvent::Workflow(WorkflowEvent::Closed { .. }) => EventSeverity::Info,
            CoreEvent::Notification(NotificationEvent::Shown { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Browse Events
// ============================================================================

/// Events related to browsing collections and loading pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum BrowseEvent {
    /// Collection metadata list loaded.
    CollectionsLoaded {
        /// Number of collections available.
        count: usize,
    },
    /// The browsed collection changed.
    CollectionSelected {
        /// The newly browsed collection.
        collection_id: String,
    },
    /// A page fetch was issued.
    PageRequested {
        collection_id: String,
        offset: u32,
        page_size: u32,
        /// Monotonic request token.
        token: u64,
    },
    /// A page fetch resolved and was applied.
    PageLoaded {
        collection_id: String,
        offset: u32,
        /// Records on the page.
        records: usize,
        /// Total records in the collection.
        total: u64,
        token: u64,
    },
    /// A page fetch failed; the view renders an empty page.
    PageFailed {
        collection_id: String,
        token: u64,
        message: String,
    },
    /// A page response resolved after a newer request and was dropped.
    StaleResponseDiscarded {
        collection_id: String,
        /// Token of the dropped response.
        token: u64,
        /// Token of the newest issued request.
        latest_token: u64,
    },
}

impl BrowseEvent {
    fn description(&self) -> &str {
        match self {
            BrowseEvent::CollectionsLoaded { .. } => "Collections loaded",
            BrowseEvent::CollectionSelected { .. } => "Collection selected",
            BrowseEvent::PageRequested { .. } => "Page requested",
            BrowseEvent::PageLoaded { .. } => "Page loaded",
            BrowseEvent::PageFailed { .. } => "Page load failed",
            BrowseEvent::StaleResponseDiscarded { .. } => "Stale page response discarded",
        }
    }
}

// ============================================================================
// Workflow Events
// ============================================================================

/// Why a workflow invocation ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CloseReason {
    /// The transfer succeeded.
    Completed,
    /// The user closed the workflow.
    Cancelled,
}

/// Events related to the selection-transfer workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum WorkflowEvent {
    /// A workflow invocation opened.
    Opened {
        workflow_id: String,
        /// Collection the records are moved from.
        origin_collection_id: String,
    },
    /// The selection size changed.
    SelectionChanged { workflow_id: String, size: usize },
    /// A destination collection was chosen.
    DestinationChosen {
        workflow_id: String,
        destination_collection_id: String,
    },
    /// The stage moved forward or back.
    StageChanged {
        workflow_id: String,
        from: String,
        to: String,
    },
    /// The workflow invocation ended.
    Closed {
        workflow_id: String,
        reason: CloseReason,
    },
}

impl WorkflowEvent {
    fn description(&self) -> &str {
        match self {
            WorkflowEvent::Opened { .. } => "Workflow opened",
            WorkflowEvent::SelectionChanged { .. } => "Selection changed",
            WorkflowEvent::DestinationChosen { .. } => "Destination chosen",
            WorkflowEvent::StageChanged { .. } => "Workflow stage changed",
            WorkflowEvent::Closed { .. } => "Workflow closed",
        }
    }
}

// ============================================================================
// Transfer Events
// ============================================================================

/// Events related to executing a transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TransferEvent {
    /// The move collaborator was invoked.
    Started {
        workflow_id: String,
        record_count: usize,
        destination_collection_id: String,
    },
    /// The move succeeded.
    Completed {
        workflow_id: String,
        records_added: u64,
        records_already_present: u64,
    },
    /// The move failed; the workflow stays open for a retry.
    Failed {
        workflow_id: String,
        message: String,
        /// Whether retrying the same request may succeed.
        retryable: bool,
    },
    /// The move finished after its workflow was closed; the result was dropped.
    Discarded { workflow_id: String, succeeded: bool },
}

impl TransferEvent {
    fn description(&self) -> &str {
        match self {
            TransferEvent::Started { .. } => "Transfer started",
            TransferEvent::Completed { .. } => "Transfer completed",
            TransferEvent::Failed { .. } => "Transfer failed",
            TransferEvent::Discarded { .. } => "Transfer result discarded",
        }
    }
}

// ============================================================================
// Notification Events
// ============================================================================

/// Kind of a transient notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// Events related to transient, auto-dismissing notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NotificationEvent {
    /// A notification became visible.
    Shown {
        notification_id: String,
        kind: NotificationKind,
        message: String,
    },
    /// A notification went away.
    Dismissed {
        notification_id: String,
        /// True when it expired, false when dismissed explicitly.
        expired: bool,
    },
}

impl NotificationEvent {
    fn description(&self) -> &str {
        match self {
            NotificationEvent::Shown { .. } => "Notification shown",
            NotificationEvent::Dismissed { .. } => "Notification dismissed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to core events.
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// Subscribers that fall behind by more than `capacity` events receive
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(100);
/// let transfers = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Transfer(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(id: &str) -> CoreEvent {
        CoreEvent::Browse(BrowseEvent::CollectionSelected {
            collection_id: id.to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(selected("c1")).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Workflow(WorkflowEvent::Opened {
            workflow_id: "wf-1".to_string(),
            origin_collection_id: "c1".to_string(),
        });

        assert_eq!(bus.emit(event.clone()).unwrap(), 2);
        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Transfer(_)));

        bus.emit(selected("c1")).ok();

        let transfer = CoreEvent::Transfer(TransferEvent::Completed {
            workflow_id: "wf-1".to_string(),
            records_added: 2,
            records_already_present: 1,
        });
        bus.emit(transfer.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), transfer);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(selected(&format!("c{}", i))).ok();
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let failed = CoreEvent::Transfer(TransferEvent::Failed {
            workflow_id: "wf-1".to_string(),
            message: "connection reset".to_string(),
            retryable: true,
        });
        assert_eq!(failed.severity(), EventSeverity::Error);

        let stale = CoreEvent::Browse(BrowseEvent::StaleResponseDiscarded {
            collection_id: "x".to_string(),
            token: 1,
            latest_token: 2,
        });
        assert_eq!(stale.severity(), EventSeverity::Warning);

        let requested = CoreEvent::Browse(BrowseEvent::PageRequested {
            collection_id: "x".to_string(),
            offset: 0,
            page_size: 25,
            token: 1,
        });
        assert_eq!(requested.severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_description() {
        let event = CoreEvent::Notification(NotificationEvent::Dismissed {
            notification_id: "n1".to_string(),
            expired: true,
        });
        assert_eq!(event.description(), "Notification dismissed");
    }

    #[tokio::test]
    async fn test_try_recv() {
        let bus = EventBus::default();
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());

        bus.emit(selected("c1")).ok();
        let received = stream.try_recv().unwrap().unwrap();
        assert_eq!(received, selected("c1"));
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Workflow(WorkflowEvent::Closed {
            workflow_id: "wf-9".to_string(),
            reason: CloseReason::Cancelled,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Workflow");
        assert_eq!(json["payload"]["event"], "Closed");
        assert_eq!(json["payload"]["reason"], "Cancelled");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
