use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use super::util::with_retry;
use crate::core::config::ProviderConfig;
use crate::core::currency::RatesProvider;
use crate::core::error::{FxError, Result};
use crate::core::rates::RateTable;

/// Client for a Frankfurter style rates API (`/latest`, `/{date}?from={base}`).
pub struct FrankfurterProvider {
    base_url: String,
    retries: usize,
    retry_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct RatesResponse {
    base: String,
    date: NaiveDate,
    rates: BTreeMap<String, f64>,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str) -> Self {
        FrankfurterProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            retries: 0,
            retry_delay_ms: 0,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(&config.base_url).with_retries(config.retries, config.retry_delay_ms)
    }

    pub fn with_retries(mut self, retries: usize, retry_delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    async fn get_table(&self, url: &str, date_label: &str, base_label: &str) -> Result<RateTable> {
        debug!("Requesting rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("fxconv/0.1")
            .build()
            .map_err(|e| FxError::Network(e.to_string()))?;
        let response = with_retry(
            || client.get(url).send(),
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .map_err(|e| FxError::Network(format!("Request error: {e} for URL: {url}")))?;

        debug!(status = %response.status(), "Received rates response");

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(FxError::NotFound {
                    date: date_label.to_string(),
                    base: base_label.to_string(),
                });
            }
            status if !status.is_success() => {
                return Err(FxError::Network(format!(
                    "HTTP error: {status} for URL: {url}"
                )));
            }
            _ => {}
        }

        let text = response
            .text()
            .await
            .map_err(|e| FxError::Network(format!("Failed to read response from {url}: {e}")))?;
        let data: RatesResponse = serde_json::from_str(&text).map_err(|e| {
            FxError::Network(format!("Failed to parse JSON response from {url}: {e}"))
        })?;

        RateTable::new(data.date, &data.base, data.rates)
    }
}

#[async_trait]
impl RatesProvider for FrankfurterProvider {
    #[instrument(name = "FrankfurterLatest", skip(self))]
    async fn fetch_latest(&self) -> Result<RateTable> {
        let url = format!("{}/latest", self.base_url);
        self.get_table(&url, "latest", "default").await
    }

    #[instrument(
        name = "FrankfurterByDate",
        skip(self),
        fields(date = %date, base = %base)
    )]
    async fn fetch_by_date(&self, date: NaiveDate, base: &str) -> Result<RateTable> {
        let date_label = date.format("%Y-%m-%d").to_string();
        let url = format!("{}/{}?from={}", self.base_url, date_label, base);
        self.get_table(&url, &date_label, base).await
    }
}
