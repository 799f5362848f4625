//! SQLite collection store
//!
//! Implements the three collection collaborators on top of the local schema.
//! `move_records` adds the requested records to the destination and skips the
//! ones already there; origin membership is left untouched.

use crate::error::{LibraryError, Result};
use crate::models::{CollectionRow, RecordRow};
use async_trait::async_trait;
use bridge_traits::collections::{
    Collection, CollectionId, CollectionSource, Record, RecordId, RecordPage, RecordSource,
    TransferRequest, TransferResult, TransferService,
};
use bridge_traits::error::Result as BridgeResult;
use sqlx::{query, query_as, query_scalar, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// SQLite implementation of the collection collaborators
#[derive(Clone)]
pub struct SqliteCollectionStore {
    pool: SqlitePool,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn collection_not_found(role: &str, id: &CollectionId) -> LibraryError {
    LibraryError::NotFound {
        entity_type: format!("{} collection", role),
        id: id.to_string(),
    }
}

impl SqliteCollectionStore {
    /// Create a new SqliteCollectionStore
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a collection with a generated id
    pub async fn create_collection(&self, name: &str) -> Result<Collection> {
        let id = CollectionId::new(Uuid::new_v4().to_string());
        self.create_collection_with_id(id, name).await
    }

    /// Create a collection with a caller-provided id
    ///
    /// # Errors
    /// Returns error if a collection with the same id exists.
    pub async fn create_collection_with_id(
        &self,
        id: CollectionId,
        name: &str,
    ) -> Result<Collection> {
        if name.trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "collection_name".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        query("INSERT INTO collections (id, collection_name, created_at) VALUES (?, ?, ?)")
            .bind(id.as_str())
            .bind(name)
            .bind(now_millis())
            .execute(&self.pool)
            .await?;

        debug!(collection_id = %id, name, "Created collection");
        Ok(Collection::new(id, name))
    }

    /// Insert a record or update its display fields
    pub async fn upsert_record(&self, record: &Record) -> Result<()> {
        query(
            r#"
            INSERT INTO records (id, record_name, liked)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                record_name = excluded.record_name,
                liked = excluded.liked
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(record.liked)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add existing records to a collection
    ///
    /// # Returns
    /// Number of records that were not already members
    pub async fn add_to_collection(
        &self,
        collection_id: &CollectionId,
        record_ids: &[RecordId],
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        Self::ensure_collection(&mut tx, collection_id, "Target").await?;
        let added = Self::insert_memberships(&mut tx, collection_id, record_ids).await?;
        tx.commit().await?;
        Ok(added)
    }

    /// Record ids in a collection, ordered by id
    pub async fn record_ids(&self, collection_id: &CollectionId) -> Result<Vec<RecordId>> {
        let ids = query_scalar::<_, i64>(
            "SELECT record_id FROM collection_records WHERE collection_id = ? ORDER BY record_id",
        )
        .bind(collection_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn collection_exists(
        tx: &mut Transaction<'_, Sqlite>,
        collection_id: &CollectionId,
    ) -> Result<bool> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM collections WHERE id = ?")
            .bind(collection_id.as_str())
            .fetch_one(&mut **tx)
            .await?;
        Ok(count > 0)
    }

    async fn ensure_collection(
        tx: &mut Transaction<'_, Sqlite>,
        collection_id: &CollectionId,
        role: &str,
    ) -> Result<()> {
        if Self::collection_exists(tx, collection_id).await? {
            Ok(())
        } else {
            Err(collection_not_found(role, collection_id))
        }
    }

    /// Insert memberships, skipping existing ones. Every record must exist.
    async fn insert_memberships(
        tx: &mut Transaction<'_, Sqlite>,
        collection_id: &CollectionId,
        record_ids: &[RecordId],
    ) -> Result<u64> {
        let added_at = now_millis();
        let mut added = 0;

        for record_id in record_ids {
            let exists = query_scalar::<_, i64>("SELECT COUNT(*) FROM records WHERE id = ?")
                .bind(record_id)
                .fetch_one(&mut **tx)
                .await?;
            if exists == 0 {
                return Err(LibraryError::NotFound {
                    entity_type: "Record".to_string(),
                    id: record_id.to_string(),
                });
            }

            let result = query(
                r#"
                INSERT OR IGNORE INTO collection_records (collection_id, record_id, added_at)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(collection_id.as_str())
            .bind(record_id)
            .bind(added_at)
            .execute(&mut **tx)
            .await?;

            added += result.rows_affected();
        }

        Ok(added)
    }

    async fn fetch_page(
        &self,
        collection_id: &CollectionId,
        offset: u32,
        limit: u32,
    ) -> Result<RecordPage> {
        let exists = query_scalar::<_, i64>("SELECT COUNT(*) FROM collections WHERE id = ?")
            .bind(collection_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        if exists == 0 {
            return Err(collection_not_found("Requested", collection_id));
        }

        let total = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM collection_records WHERE collection_id = ?",
        )
        .bind(collection_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        let rows = query_as::<_, RecordRow>(
            r#"
            SELECT r.id, r.record_name, r.liked
            FROM collection_records cr
            JOIN records r ON r.id = cr.record_id
            WHERE cr.collection_id = ?
            ORDER BY r.id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(collection_id.as_str())
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(RecordPage {
            records: rows.into_iter().map(Record::from).collect(),
            total: total.max(0) as u64,
        })
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TransferResult> {
        request
            .validate()
            .map_err(|message| LibraryError::InvalidInput {
                field: "TransferRequest".to_string(),
                message,
            })?;

        let mut tx = self.pool.begin().await?;
        Self::ensure_collection(&mut tx, &request.origin_collection_id, "Origin").await?;
        Self::ensure_collection(&mut tx, &request.destination_collection_id, "Destination")
            .await?;

        // Dropping `tx` on error rolls back.
        let added = Self::insert_memberships(
            &mut tx,
            &request.destination_collection_id,
            &request.record_ids,
        )
        .await?;
        tx.commit().await?;

        let requested = request.record_ids.len() as u64;
        Ok(TransferResult::new(added, requested - added))
    }
}

#[async_trait]
impl CollectionSource for SqliteCollectionStore {
    async fn list_collections(&self) -> BridgeResult<Vec<Collection>> {
        let rows = query_as::<_, CollectionRow>(
            "SELECT id, collection_name, created_at FROM collections ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(LibraryError::from)?;

        Ok(rows.into_iter().map(Collection::from).collect())
    }
}

#[async_trait]
impl RecordSource for SqliteCollectionStore {
    #[instrument(skip(self), fields(collection_id = %collection_id))]
    async fn list_records(
        &self,
        collection_id: &CollectionId,
        offset: u32,
        limit: u32,
    ) -> BridgeResult<RecordPage> {
        Ok(self.fetch_page(collection_id, offset, limit).await?)
    }
}

#[async_trait]
impl TransferService for SqliteCollectionStore {
    #[instrument(skip(self, request), fields(
        origin = %request.origin_collection_id,
        destination = %request.destination_collection_id
    ))]
    async fn move_records(&self, request: &TransferRequest) -> BridgeResult<TransferResult> {
        let result = self.transfer(request).await?;
        info!(
            records_added = result.records_added,
            already_present = result.records_already_present,
            "Moved records"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use bridge_traits::error::BridgeError;

    async fn seeded_store() -> (SqliteCollectionStore, Collection, Collection) {
        let store = SqliteCollectionStore::new(create_test_pool().await.unwrap());
        let origin = store.create_collection("My List").await.unwrap();
        let target = store.create_collection("Target").await.unwrap();
        for id in 1..=5 {
            store
                .upsert_record(&Record::new(id, format!("Company {}", id), id % 2 == 0))
                .await
                .unwrap();
        }
        store
            .add_to_collection(&origin.id, &[1, 2, 3, 4, 5])
            .await
            .unwrap();
        (store, origin, target)
    }

    #[tokio::test]
    async fn test_list_collections_in_creation_order() {
        let (store, origin, target) = seeded_store().await;
        let collections = store.list_collections().await.unwrap();
        assert_eq!(collections, vec![origin, target]);
    }

    #[tokio::test]
    async fn test_list_records_pages_by_id() {
        let (store, origin, _) = seeded_store().await;

        let page = store.list_records(&origin.id, 2, 2).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(
            page.records.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![3, 4]
        );
        assert!(page.records[1].liked);
    }

    #[tokio::test]
    async fn test_list_records_unknown_collection() {
        let (store, _, _) = seeded_store().await;
        let err = store
            .list_records(&CollectionId::new("missing"), 0, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upsert_updates_fields() {
        let (store, origin, _) = seeded_store().await;
        store
            .upsert_record(&Record::new(1, "Renamed", true))
            .await
            .unwrap();

        let page = store.list_records(&origin.id, 0, 1).await.unwrap();
        assert_eq!(page.records[0], Record::new(1, "Renamed", true));
    }

    #[tokio::test]
    async fn test_move_rejects_unknown_record() {
        let (store, origin, target) = seeded_store().await;
        let request = TransferRequest::new(vec![1, 99], origin.id, target.id.clone());

        let err = store.move_records(&request).await.unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));
        // Rolled back: record 1 was not added either.
        assert!(store.record_ids(&target.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_collection_rejects_blank_name() {
        let store = SqliteCollectionStore::new(create_test_pool().await.unwrap());
        let err = store.create_collection("  ").await.unwrap_err();
        assert!(matches!(err, LibraryError::InvalidInput { .. }));
    }
}
