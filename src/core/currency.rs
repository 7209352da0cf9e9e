//! Exchange rate source abstractions

use super::error::Result;
use super::rates::RateTable;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait RatesProvider: Send + Sync {
    /// Most recently published table, in whatever base the source defaults to.
    async fn fetch_latest(&self) -> Result<RateTable>;

    /// Table published for `date`, expressed relative to `base`.
    async fn fetch_by_date(&self, date: NaiveDate, base: &str) -> Result<RateTable>;
}
