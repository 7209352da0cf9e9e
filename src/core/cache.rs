use super::rates::RateTable;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Identifies a published table: the day and the base it is expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableKey {
    pub date: NaiveDate,
    pub base: String,
}

impl TableKey {
    pub fn new(date: NaiveDate, base: &str) -> Self {
        TableKey {
            date,
            base: base.to_string(),
        }
    }
}

/// Shared store of rate tables. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct TableCache {
    inner: Arc<Mutex<HashMap<TableKey, RateTable>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &TableKey) -> Option<RateTable> {
        let cache = self.inner.lock().await;
        let value = cache.get(key).cloned();
        if value.is_some() {
            debug!(?key, "Rate table cache HIT");
        } else {
            debug!(?key, "Rate table cache MISS");
        }
        value
    }

    pub async fn put(&self, key: TableKey, table: RateTable) {
        let mut cache = self.inner.lock().await;
        debug!(?key, "Rate table cache PUT");
        cache.insert(key, table);
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
