//! # Collections REST Provider
//!
//! Implements the collection collaborator traits against the collections
//! REST API.
//!
//! ## Overview
//!
//! This module provides:
//! - Collection metadata listing (`GET /collections`)
//! - Paginated record listing (`GET /collections/{id}?offset=&limit=`)
//! - Bulk, idempotent record transfer (`PUT /collections/add-companies`)
//! - Status mapping onto `BridgeError` (404 → `NotFound`, 400/422 → `Rejected`)
//! - Exponential backoff for reads; transfers are sent exactly once

pub mod connector;
pub mod error;
pub mod types;

pub use connector::JamApiConnector;
pub use error::{JamApiError, Result};
