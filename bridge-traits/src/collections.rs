//! Collection Collaborator Contracts
//!
//! Shared data model for collections and records, plus the three collaborator
//! operations the workflow core consumes: listing collections, listing one page
//! of records, and moving records between collections.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::Result;

/// Collection identifier.
///
/// Collections are keyed by this id only. Display names may collide and are
/// never used for lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CollectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CollectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Record identifier
pub type RecordId = i64;

/// A single record as seen by the workflow. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub liked: bool,
}

impl Record {
    pub fn new(id: RecordId, name: impl Into<String>, liked: bool) -> Self {
        Self {
            id,
            name: name.into(),
            liked,
        }
    }
}

/// A named grouping of records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
}

impl Collection {
    pub fn new(id: impl Into<CollectionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One page of records together with the collection's total size
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub total: u64,
}

/// Bulk move request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub record_ids: Vec<RecordId>,
    pub origin_collection_id: CollectionId,
    pub destination_collection_id: CollectionId,
}

impl TransferRequest {
    pub fn new(
        record_ids: Vec<RecordId>,
        origin_collection_id: CollectionId,
        destination_collection_id: CollectionId,
    ) -> Self {
        Self {
            record_ids,
            origin_collection_id,
            destination_collection_id,
        }
    }

    /// Check the request shape before it is sent anywhere.
    ///
    /// Returns the reason the request would be refused: no ids, duplicate ids,
    /// or origin equal to destination.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.record_ids.is_empty() {
            return Err("record_ids must not be empty".to_string());
        }

        let mut seen = HashSet::with_capacity(self.record_ids.len());
        if let Some(dup) = self.record_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(format!("record_ids must be unique (duplicate id {})", dup));
        }

        if self.origin_collection_id == self.destination_collection_id {
            return Err(
                "origin and destination collections must be different".to_string(),
            );
        }

        Ok(())
    }
}

/// Outcome of a bulk move
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    /// Records newly present at the destination
    pub records_added: u64,
    /// Records skipped because they were already at the destination
    pub records_already_present: u64,
}

impl TransferResult {
    pub fn new(records_added: u64, records_already_present: u64) -> Self {
        Self {
            records_added,
            records_already_present,
        }
    }

    /// Everything requested was already at the destination
    pub fn is_noop(&self) -> bool {
        self.records_added == 0
    }
}

/// Source of collection metadata
///
/// # Example
///
/// ```ignore
/// use bridge_traits::collections::CollectionSource;
///
/// async fn first_collection(source: &dyn CollectionSource) -> Option<Collection> {
///     source.list_collections().await.ok()?.into_iter().next()
/// }
/// ```
#[async_trait]
pub trait CollectionSource: Send + Sync {
    /// List all collections in display order
    async fn list_collections(&self) -> Result<Vec<Collection>>;
}

/// Paginated record listing
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch records `[offset, offset + limit)` of a collection
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::NotFound` when the collection does not exist and
    /// `BridgeError::OperationFailed` on transport failure.
    async fn list_records(
        &self,
        collection_id: &CollectionId,
        offset: u32,
        limit: u32,
    ) -> Result<RecordPage>;
}

/// Performs the actual move
///
/// Implementations must be idempotent with respect to records already present
/// at the destination: those are counted in `records_already_present`, never
/// in `records_added`.
#[async_trait]
pub trait TransferService: Send + Sync {
    async fn move_records(&self, request: &TransferRequest) -> Result<TransferResult>;
}
