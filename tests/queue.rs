use skitter_crawl::{FetchQueue, MemoryQueue, QueueItemFilter, QueueItemUpdate, Status};
use skitter_crawl::url_processor::{process_url, ProcessOptions, Referrer};

fn item(url: &str) -> skitter_crawl::QueueItem {
    process_url(url, &Referrer::seed(url), &ProcessOptions::default()).unwrap()
}

#[tokio::test]
async fn add_assigns_id_equal_to_position() {
    let queue = MemoryQueue::new();
    let a = queue.add(item("http://host/a"), false).await.unwrap();
    let b = queue.add(item("http://host/b"), false).await.unwrap();
    assert_eq!(a.id, 0);
    assert_eq!(b.id, 1);
}

#[tokio::test]
async fn duplicate_add_without_force_fails() {
    let queue = MemoryQueue::new();
    queue.add(item("http://host/a"), false).await.unwrap();
    let err = queue.add(item("http://host/a"), false).await.unwrap_err();
    assert!(matches!(err, skitter_crawl::QueueError::Duplicate(_)));
}

#[tokio::test]
async fn exists_reflects_scan_index() {
    let queue = MemoryQueue::new();
    assert!(!queue.exists("http://host/a").await);
    queue.add(item("http://host/a"), false).await.unwrap();
    assert!(queue.exists("http://host/a").await);
}

#[tokio::test]
async fn oldest_unfetched_item_is_monotone() {
    let queue = MemoryQueue::new();
    queue.add(item("http://host/a"), false).await.unwrap();
    queue.add(item("http://host/b"), false).await.unwrap();

    let first = queue.oldest_unfetched_item().await.unwrap();
    assert_eq!(first.id, 0);

    queue
        .update(0, QueueItemUpdate { fetched: Some(true), status: Some(Status::Downloaded), ..Default::default() })
        .await
        .unwrap();

    let second = queue.oldest_unfetched_item().await.unwrap();
    assert_eq!(second.id, 1);
}

#[tokio::test]
async fn oldest_unfetched_item_is_none_when_all_fetched() {
    let queue = MemoryQueue::new();
    queue.add(item("http://host/a"), false).await.unwrap();
    queue
        .update(0, QueueItemUpdate { fetched: Some(true), status: Some(Status::Downloaded), ..Default::default() })
        .await
        .unwrap();
    assert!(queue.oldest_unfetched_item().await.is_none());
}

#[tokio::test]
async fn unknown_statistic_name_is_rejected() {
    let queue = MemoryQueue::new();
    assert!(queue.max("not_a_real_stat").await.is_err());
}

#[tokio::test]
async fn avg_on_empty_set_is_nan() {
    let queue = MemoryQueue::new();
    let avg = queue.avg("actual_data_size").await.unwrap();
    assert!(avg.is_nan());
}

#[tokio::test]
async fn max_and_min_over_fetched_items() {
    let queue = MemoryQueue::new();
    queue.add(item("http://host/a"), false).await.unwrap();
    queue.add(item("http://host/b"), false).await.unwrap();
    queue
        .update(0, QueueItemUpdate { fetched: Some(true), actual_data_size: Some(10), ..Default::default() })
        .await
        .unwrap();
    queue
        .update(1, QueueItemUpdate { fetched: Some(true), actual_data_size: Some(50), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(queue.max("actual_data_size").await.unwrap(), 50.0);
    assert_eq!(queue.min("actual_data_size").await.unwrap(), 10.0);
}

#[tokio::test]
async fn count_and_filter_items_by_status() {
    let queue = MemoryQueue::new();
    queue.add(item("http://host/a"), false).await.unwrap();
    queue.add(item("http://host/b"), false).await.unwrap();
    queue
        .update(0, QueueItemUpdate { fetched: Some(true), status: Some(Status::Downloaded), ..Default::default() })
        .await
        .unwrap();

    let filter = QueueItemFilter { status: Some(Status::Downloaded), ..Default::default() };
    assert_eq!(queue.count_items(&filter).await, 1);
    assert_eq!(queue.filter_items(&filter).await[0].id, 0);
}

#[tokio::test]
async fn freeze_and_defrost_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.json");

    let queue = MemoryQueue::new();
    queue.add(item("http://host/a"), false).await.unwrap();
    queue.add(item("http://host/b"), false).await.unwrap();
    queue
        .update(0, QueueItemUpdate { status: Some(Status::Spooled), ..Default::default() })
        .await
        .unwrap();

    queue.freeze(&path).await.unwrap();

    let restored = MemoryQueue::new();
    restored.defrost(&path).await.unwrap();

    assert_eq!(restored.len().await, 2);
    // in-flight status was rewritten back to queued before the snapshot.
    let restored_item = restored.get(0).await.unwrap();
    assert_eq!(restored_item.status, Status::Queued);
    assert!(restored.exists("http://host/b").await);
}

#[tokio::test]
async fn get_out_of_range_is_an_error() {
    let queue = MemoryQueue::new();
    assert!(queue.get(0).await.is_err());
}
