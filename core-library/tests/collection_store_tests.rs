//! Integration tests for the SQLite collection store

use bridge_traits::collections::{
    CollectionId, CollectionSource, Record, RecordSource, TransferRequest, TransferService,
};
use bridge_traits::error::BridgeError;
use core_library::db::create_test_pool;
use core_library::SqliteCollectionStore;

async fn store_with_lists() -> (SqliteCollectionStore, CollectionId, CollectionId) {
    let store = SqliteCollectionStore::new(create_test_pool().await.unwrap());
    let origin = CollectionId::new("my-list");
    let liked = CollectionId::new("liked");
    store
        .create_collection_with_id(origin.clone(), "My List")
        .await
        .unwrap();
    store
        .create_collection_with_id(liked.clone(), "Liked Companies")
        .await
        .unwrap();

    for id in 1..=30 {
        store
            .upsert_record(&Record::new(id, format!("Company {}", id), false))
            .await
            .unwrap();
    }
    let ids: Vec<i64> = (1..=30).collect();
    store.add_to_collection(&origin, &ids).await.unwrap();

    (store, origin, liked)
}

#[tokio::test]
async fn move_is_idempotent() {
    let (store, origin, liked) = store_with_lists().await;
    let request = TransferRequest::new(vec![3, 1, 2], origin.clone(), liked.clone());

    let first = store.move_records(&request).await.unwrap();
    assert_eq!(first.records_added, 3);
    assert_eq!(first.records_already_present, 0);

    let second = store.move_records(&request).await.unwrap();
    assert_eq!(second.records_added, 0);
    assert_eq!(second.records_already_present, 3);
    assert!(second.is_noop());

    assert_eq!(store.record_ids(&liked).await.unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn move_reports_partial_overlap() {
    let (store, origin, liked) = store_with_lists().await;
    store.add_to_collection(&liked, &[2]).await.unwrap();

    let request = TransferRequest::new(vec![1, 2, 3], origin, liked);
    let result = store.move_records(&request).await.unwrap();

    assert_eq!(result.records_added, 2);
    assert_eq!(result.records_already_present, 1);
}

#[tokio::test]
async fn move_leaves_origin_untouched() {
    let (store, origin, liked) = store_with_lists().await;
    let request = TransferRequest::new(vec![5, 6], origin.clone(), liked);
    store.move_records(&request).await.unwrap();

    let page = store.list_records(&origin, 0, 100).await.unwrap();
    assert_eq!(page.total, 30);
    assert_eq!(page.records.len(), 30);
}

#[tokio::test]
async fn move_rejects_invalid_requests() {
    let (store, origin, liked) = store_with_lists().await;

    let empty = TransferRequest::new(vec![], origin.clone(), liked.clone());
    assert!(matches!(
        store.move_records(&empty).await,
        Err(BridgeError::Rejected(_))
    ));

    let same = TransferRequest::new(vec![1], origin.clone(), origin.clone());
    assert!(matches!(
        store.move_records(&same).await,
        Err(BridgeError::Rejected(_))
    ));

    let duplicate = TransferRequest::new(vec![1, 1], origin, liked.clone());
    assert!(matches!(
        store.move_records(&duplicate).await,
        Err(BridgeError::Rejected(_))
    ));

    assert!(store.record_ids(&liked).await.unwrap().is_empty());
}

#[tokio::test]
async fn move_to_unknown_destination_is_not_found() {
    let (store, origin, _) = store_with_lists().await;
    let request = TransferRequest::new(vec![1], origin, CollectionId::new("gone"));

    match store.move_records(&request).await {
        Err(BridgeError::NotFound(message)) => {
            assert!(message.contains("Destination collection"));
            assert!(message.contains("gone"));
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn paging_past_the_end_returns_empty_page() {
    let (store, origin, _) = store_with_lists().await;

    let last = store.list_records(&origin, 25, 25).await.unwrap();
    assert_eq!(last.records.len(), 5);
    assert_eq!(last.total, 30);

    let beyond = store.list_records(&origin, 50, 25).await.unwrap();
    assert!(beyond.records.is_empty());
    assert_eq!(beyond.total, 30);
}

#[tokio::test]
async fn collections_are_listed_with_names() {
    let (store, _, _) = store_with_lists().await;
    let names: Vec<String> = store
        .list_collections()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["My List", "Liked Companies"]);
}
