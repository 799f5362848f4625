//! Row models for the collection store

use bridge_traits::collections::{Collection, CollectionId, Record};
use sqlx::FromRow;

/// `collections` row
#[derive(Debug, Clone, FromRow)]
pub struct CollectionRow {
    pub id: String,
    pub collection_name: String,
    pub created_at: i64,
}

impl From<CollectionRow> for Collection {
    fn from(row: CollectionRow) -> Self {
        Collection::new(CollectionId::new(row.id), row.collection_name)
    }
}

/// `records` row
#[derive(Debug, Clone, FromRow)]
pub struct RecordRow {
    pub id: i64,
    pub record_name: String,
    pub liked: bool,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Record::new(row.id, row.record_name, row.liked)
    }
}
