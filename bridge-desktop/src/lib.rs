//! # Desktop Bridge Implementations
//!
//! Default implementations of the host-side bridge traits for desktop
//! builds (macOS, Windows, Linux).
//!
//! - `HttpClient` using `reqwest`
//! - `Navigator` as an in-process history that tracks `?collection=<id>`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HistoryNavigator, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let navigator = HistoryNavigator::new();
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod http;
mod navigation;

pub use http::ReqwestHttpClient;
pub use navigation::{HistoryNavigator, DEFAULT_HISTORY_LIMIT};
