use crate::core::cache::{TableCache, TableKey};
use crate::core::currency::RatesProvider;
use crate::core::error::Result;
use crate::core::rates::RateTable;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

/// Remembers historical tables for the lifetime of the process. A published
/// day never changes, so only `fetch_by_date` successes are kept; `latest`
/// always goes to the inner provider.
#[derive(Clone)]
pub struct CachingRatesProvider<T: RatesProvider> {
    inner: T,
    cache: TableCache,
}

impl<T: RatesProvider> CachingRatesProvider<T> {
    pub fn new(inner: T) -> Self {
        Self::with_cache(inner, TableCache::new())
    }

    pub fn with_cache(inner: T, cache: TableCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<T: RatesProvider> RatesProvider for CachingRatesProvider<T> {
    async fn fetch_latest(&self) -> Result<RateTable> {
        self.inner.fetch_latest().await
    }

    async fn fetch_by_date(&self, date: NaiveDate, base: &str) -> Result<RateTable> {
        let key = TableKey::new(date, base);
        if let Some(table) = self.cache.get(&key).await {
            return Ok(table);
        }

        let table = self.inner.fetch_by_date(date, base).await?;
        debug!(%date, base, "Caching fetched rate table");
        self.cache.put(key, table.clone()).await;
        Ok(table)
    }
}
