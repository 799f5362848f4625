//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (mainly `core-service`). Host applications can depend on
//! `jam-workspace` and enable the documented features without needing to wire
//! each crate individually:
//!
//! - `desktop-shims` (default): reqwest HTTP client + REST collaborators
//! - `local-store`: SQLite-backed collection store

#[cfg(feature = "desktop-shims")]
pub use core_service::bootstrap_desktop;

#[cfg(any(feature = "desktop-shims", feature = "local-store"))]
pub use core_service::{CoreError, CoreService};

#[cfg(feature = "local-store")]
pub use core_service::bootstrap_local;
