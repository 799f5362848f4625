//! # Selection-Transfer Workflow
//!
//! Browse paginated collections, build a selection that spans pages, choose a
//! destination, and move the selection there.
//!
//! ## Components
//!
//! - [`SelectionSet`] - ordered, id-unique cross-page selection
//! - [`PagedView`] - paginated fetch with stale-response protection
//! - [`CollectionPicker`] - destination resolution by collection id
//! - [`TransferExecutor`] - single-attempt move with error classification
//! - [`WorkflowController`] - the Review → Destination → Confirm state machine
//! - [`CollectionBrowser`] - collection list and location side effects
//! - [`NotificationCenter`] - transient, auto-dismissing outcome messages
//!
//! ## Example
//!
//! ```ignore
//! let id = controller.open(origin).await?;
//! let page = view.select_on_page(&[1, 2, 3]).await;
//! controller.apply_page_selection(&page).await?;
//! controller.advance().await?;                       // PickingDestination
//! let mut picker = controller.destination_picker().await?;
//! controller.set_destination(picker.choose(&target_id)?).await?;
//! controller.advance().await?;                       // Confirming
//! match controller.advance().await? {
//!     AdvanceOutcome::Transferred(report) => println!("{}", report.message),
//!     _ => {}
//! }
//! ```

pub mod browser;
pub mod controller;
pub mod error;
pub mod executor;
pub mod notifications;
pub mod paged_view;
pub mod pagination;
pub mod picker;
pub mod selection;
pub mod stage;

pub use browser::CollectionBrowser;
pub use controller::{
    success_message, AdvanceOutcome, TransferReport, WorkflowController, WorkflowId,
    WorkflowState,
};
pub use error::{Result, TransferError, WorkflowError};
pub use executor::TransferExecutor;
pub use notifications::{Notification, NotificationCenter};
pub use paged_view::{FetchOutcome, PageSelection, PageSnapshot, PagedView};
pub use pagination::PageRequest;
pub use picker::CollectionPicker;
pub use selection::SelectionSet;
pub use stage::WorkflowStage;
