//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the collections core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions,
//! its `CoreConfig` and the broadcast `EventBus` used to surface browse,
//! workflow, transfer and notification events to the host.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, WorkflowSettings};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
