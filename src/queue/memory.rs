//! Default in-memory [`FetchQueue`] implementation.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::item::{QueueItem, Status, UNASSIGNED_ID};
use super::{FetchQueue, QueueItemFilter, QueueItemUpdate, STATISTIC_NAMES};
use crate::error::QueueError;

#[derive(Debug, Default)]
struct Inner {
    items: Vec<QueueItem>,
    scan_index: HashSet<String>,
    /// Monotonic hint: never search for the oldest unfetched item before
    /// this index again.
    oldest_unfetched_cursor: usize,
}

/// A `tokio::sync::RwLock`-guarded `Vec<QueueItem>`. An `RwLock` rather than
/// a `Mutex` since statistics and filter reads vastly outnumber writes.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    inner: RwLock<Inner>,
}

impl MemoryQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn statistic(item: &QueueItem, name: &str) -> Option<f64> {
        let sd = &item.state_data;
        let value = match name {
            "actual_data_size" => sd.actual_data_size,
            "content_length" => sd.content_length,
            "download_time" => sd.download_time,
            "request_latency" => sd.request_latency,
            "request_time" => sd.request_time,
            _ => return None,
        };
        value.map(|v| v as f64).filter(|v| v.is_finite())
    }
}

#[async_trait]
impl FetchQueue for MemoryQueue {
    async fn add(&self, mut item: QueueItem, force: bool) -> Result<QueueItem, QueueError> {
        let mut inner = self.inner.write().await;

        if inner.scan_index.contains(&item.url) {
            if !force {
                return Err(QueueError::Duplicate(item.url));
            }
            // force=true: duplicate URLs are fine, but re-submitting an
            // item that was already assigned an id by a previous add is a
            // caller bug ("cannot add twice").
            if item.id != UNASSIGNED_ID
                && inner.items.get(item.id).is_some_and(|existing| existing.url == item.url)
            {
                return Err(QueueError::AlreadyQueuedTwice);
            }
        }

        item.id = inner.items.len();
        item.status = Status::Queued;
        item.fetched = false;
        inner.scan_index.insert(item.url.clone());
        inner.items.push(item.clone());
        Ok(item)
    }

    async fn exists(&self, url: &str) -> bool {
        self.inner.read().await.scan_index.contains(url)
    }

    async fn get(&self, index: usize) -> Result<QueueItem, QueueError> {
        self.inner
            .read()
            .await
            .items
            .get(index)
            .cloned()
            .ok_or(QueueError::OutOfRange(index))
    }

    async fn update(&self, id: usize, update: QueueItemUpdate) -> Result<QueueItem, QueueError> {
        let mut inner = self.inner.write().await;
        let item = inner
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(QueueError::UnknownId(id))?;
        update.apply(item);
        Ok(item.clone())
    }

    async fn oldest_unfetched_item(&self) -> Option<QueueItem> {
        let mut inner = self.inner.write().await;
        let start = inner.oldest_unfetched_cursor;
        let found = inner.items[start..]
            .iter()
            .position(|i| i.status == Status::Queued)
            .map(|offset| start + offset);
        if let Some(idx) = found {
            inner.oldest_unfetched_cursor = idx;
            return inner.items.get(idx).cloned();
        }
        None
    }

    async fn max(&self, statistic: &str) -> Result<f64, QueueError> {
        if !STATISTIC_NAMES.contains(&statistic) {
            return Err(QueueError::InvalidStatistic(statistic.to_string()));
        }
        let inner = self.inner.read().await;
        Ok(inner
            .items
            .iter()
            .filter(|i| i.fetched)
            .filter_map(|i| Self::statistic(i, statistic))
            .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.max(v))))
            .unwrap_or(0.0))
    }

    async fn min(&self, statistic: &str) -> Result<f64, QueueError> {
        if !STATISTIC_NAMES.contains(&statistic) {
            return Err(QueueError::InvalidStatistic(statistic.to_string()));
        }
        let inner = self.inner.read().await;
        Ok(inner
            .items
            .iter()
            .filter(|i| i.fetched)
            .filter_map(|i| Self::statistic(i, statistic))
            .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.min(v))))
            .unwrap_or(0.0))
    }

    async fn avg(&self, statistic: &str) -> Result<f64, QueueError> {
        if !STATISTIC_NAMES.contains(&statistic) {
            return Err(QueueError::InvalidStatistic(statistic.to_string()));
        }
        let inner = self.inner.read().await;
        let values: Vec<f64> = inner
            .items
            .iter()
            .filter(|i| i.fetched)
            .filter_map(|i| Self::statistic(i, statistic))
            .collect();
        // Empty set yields NaN, not 0 — documented, deliberately preserved.
        #[allow(clippy::cast_precision_loss)]
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }

    async fn count_items(&self, filter: &QueueItemFilter) -> usize {
        self.inner
            .read()
            .await
            .items
            .iter()
            .filter(|i| filter.matches(i))
            .count()
    }

    async fn filter_items(&self, filter: &QueueItemFilter) -> Vec<QueueItem> {
        self.inner
            .read()
            .await
            .items
            .iter()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect()
    }

    async fn len(&self) -> usize {
        self.inner.read().await.items.len()
    }

    async fn freeze(&self, path: &Path) -> Result<(), QueueError> {
        let mut inner = self.inner.write().await;
        for item in &mut inner.items {
            if !item.fetched {
                item.status = Status::Queued;
            }
        }
        let json = serde_json::to_vec_pretty(&inner.items)
            .map_err(|e| QueueError::Snapshot(e.to_string()))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| QueueError::Snapshot(e.to_string()))?;
        Ok(())
    }

    async fn defrost(&self, path: &Path) -> Result<(), QueueError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| QueueError::Snapshot(e.to_string()))?;
        let items: Vec<QueueItem> =
            serde_json::from_slice(&bytes).map_err(|e| QueueError::Snapshot(e.to_string()))?;

        let mut inner = self.inner.write().await;
        inner.scan_index = items.iter().map(|i| i.url.clone()).collect();
        inner.oldest_unfetched_cursor = items
            .iter()
            .position(|i| i.status == Status::Queued)
            .unwrap_or(items.len());
        inner.items = items;
        Ok(())
    }
}
