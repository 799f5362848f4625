//! # Collection Store
//!
//! SQLite-backed implementation of the collection collaborators.
//!
//! ## Overview
//!
//! This crate manages:
//! - SQLite schema and embedded migrations for collections, records and
//!   collection membership
//! - Connection pooling (`db`)
//! - `SqliteCollectionStore`, which implements `CollectionSource`,
//!   `RecordSource` and `TransferService` with idempotent move semantics

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use repositories::SqliteCollectionStore;
