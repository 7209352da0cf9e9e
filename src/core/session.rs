//! Converter session: the form values a user edits, the values derived from
//! them, and the fetch state machine that keeps the rate table current.
//!
//! The session never performs I/O on its own. Actions that need fresh rates
//! hand back a [`FetchRequest`]; the caller runs it (see
//! [`FetchRequest::execute`]) and feeds the result to
//! [`ConverterSession::apply_fetch`]. Only the most recently issued request
//! may replace the table, so overlapping fetches resolve last-request-wins.

use super::config::AppConfig;
use super::currency::RatesProvider;
use super::error::{FxError, Result};
use super::rates::{RateTable, normalize_code, validate_amount};
use super::table::{CurrencyTableRow, SortDirective, sort_rows};
use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching { request_id: u64 },
}

/// A pending rates lookup. `date: None` asks for the latest table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: u64,
    pub date: Option<NaiveDate>,
    pub base: String,
}

impl FetchRequest {
    pub async fn execute(&self, provider: &dyn RatesProvider) -> Result<RateTable> {
        match self.date {
            Some(date) => provider.fetch_by_date(date, &self.base).await,
            None => provider.fetch_latest().await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The table was replaced. `published` can be earlier than `requested`
    /// when the source has no rates for the requested day.
    Applied {
        requested: Option<NaiveDate>,
        published: NaiveDate,
    },
    /// A newer request was issued after this one; the result was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct ConverterSession {
    table: Option<RateTable>,
    source: String,
    target: String,
    amount: f64,
    sort: SortDirective,
    state: FetchState,
    last_request: u64,
    /// Date the loaded table was asked for; `None` for the latest table.
    loaded_request: Option<NaiveDate>,
    pending_date: Option<NaiveDate>,
}

impl ConverterSession {
    pub fn new(source: &str, target: &str, amount: f64) -> Result<Self> {
        let source = normalize_code(source)?;
        let target = normalize_code(target)?;
        if source == target {
            return Err(FxError::validation(
                "source and target currencies must differ",
            ));
        }
        validate_amount(amount)?;

        Ok(ConverterSession {
            table: None,
            source,
            target,
            amount,
            sort: SortDirective::default(),
            state: FetchState::Idle,
            last_request: 0,
            loaded_request: None,
            pending_date: None,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.source_currency,
            &config.target_currency,
            config.amount,
        )
    }

    pub fn table(&self) -> Option<&RateTable> {
        self.table.as_ref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.table.as_ref().map(RateTable::date)
    }

    pub fn sort(&self) -> SortDirective {
        self.sort
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.state, FetchState::Fetching { .. })
    }

    /// Every code the table knows about, base included, alphabetically.
    pub fn source_currencies(&self) -> Vec<String> {
        let Some(table) = &self.table else {
            return Vec::new();
        };
        let mut codes: Vec<String> = table.rates().keys().cloned().collect();
        codes.push(table.base().to_string());
        codes.sort();
        codes
    }

    pub fn target_currencies(&self) -> Vec<String> {
        self.source_currencies()
            .into_iter()
            .filter(|code| *code != self.source)
            .collect()
    }

    /// `amount` expressed in the target currency, once a table is loaded.
    pub fn target_amount(&self) -> Option<f64> {
        self.table
            .as_ref()
            .and_then(|t| t.convert(&self.source, &self.target, self.amount).ok())
    }

    /// Table rows in the current sort order.
    pub fn rows(&self) -> Vec<CurrencyTableRow> {
        self.table
            .as_ref()
            .map(|t| sort_rows(&t.rows(), &self.sort))
            .unwrap_or_default()
    }

    /// Switches the source currency, rebasing the loaded table. Choosing the
    /// current target flips the pair.
    pub fn set_source(&mut self, code: &str) -> Result<()> {
        let code = normalize_code(code)?;
        if code == self.source {
            return Ok(());
        }

        if let Some(table) = &self.table {
            self.table = Some(table.rebase(&code)?);
        }
        if self.target == code {
            self.target = std::mem::replace(&mut self.source, code);
        } else {
            self.source = code;
        }
        debug!(source = %self.source, target = %self.target, "Source currency changed");
        Ok(())
    }

    pub fn set_target(&mut self, code: &str) -> Result<()> {
        let code = normalize_code(code)?;
        if code == self.source {
            return Err(FxError::validation(format!(
                "target currency must differ from source {}",
                self.source
            )));
        }
        if let Some(table) = &self.table {
            if !table.contains(&code) {
                return Err(FxError::validation(format!("unknown currency {code}")));
            }
        }
        self.target = code;
        Ok(())
    }

    pub fn set_amount(&mut self, amount: f64) -> Result<()> {
        validate_amount(amount)?;
        self.amount = amount;
        Ok(())
    }

    pub fn set_sort(&mut self, sort: SortDirective) {
        self.sort = sort;
    }

    pub fn swap(&mut self) -> Result<()> {
        let target = self.target.clone();
        self.set_source(&target)
    }

    /// Validates a `YYYY-MM-DD` date and, if it differs from the loaded
    /// table's date, starts a fetch for it in the current source currency.
    ///
    /// Going back to the loaded date while another date is still being
    /// fetched cancels that fetch. Asking again for the date already in
    /// flight does nothing.
    pub fn set_date(&mut self, input: &str) -> Result<Option<FetchRequest>> {
        let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|e| {
            FxError::validation(format!("'{}' is not a valid YYYY-MM-DD date: {e}", input.trim()))
        })?;
        // Rates are published on CET business days; UTC keeps "today" the
        // same for every user instead of following the local clock.
        if date > Utc::now().date_naive() {
            return Err(FxError::validation(format!("{date} is in the future")));
        }

        if self.is_fetching() && self.pending_date == Some(date) {
            debug!(%date, "Date already being fetched");
            return Ok(None);
        }
        if self.shows_date(date) {
            if self.is_fetching() {
                self.cancel_fetch();
            }
            debug!(%date, "Date unchanged, not fetching");
            return Ok(None);
        }
        Ok(Some(self.begin_fetch(Some(date))))
    }

    /// True when the loaded table was requested for, or published on, `date`.
    fn shows_date(&self, date: NaiveDate) -> bool {
        self.table.is_some()
            && (self.loaded_request == Some(date) || self.date() == Some(date))
    }

    /// Makes any in-flight request stale and returns to idle.
    fn cancel_fetch(&mut self) {
        debug!(request_id = self.last_request, "Fetch cancelled");
        self.last_request += 1;
        self.state = FetchState::Idle;
        self.pending_date = None;
    }

    pub fn begin_latest(&mut self) -> FetchRequest {
        self.begin_fetch(None)
    }

    fn begin_fetch(&mut self, date: Option<NaiveDate>) -> FetchRequest {
        self.last_request += 1;
        self.state = FetchState::Fetching {
            request_id: self.last_request,
        };
        self.pending_date = date;
        debug!(request_id = self.last_request, ?date, base = %self.source, "Fetch started");
        FetchRequest {
            id: self.last_request,
            date,
            base: self.source.clone(),
        }
    }

    /// Applies the result of `request`. Results of superseded requests are
    /// ignored. On error the previous table stays in place.
    pub fn apply_fetch(
        &mut self,
        request: &FetchRequest,
        result: Result<RateTable>,
    ) -> Result<FetchOutcome> {
        if request.id != self.last_request {
            debug!(
                request_id = request.id,
                latest = self.last_request,
                "Discarding stale fetch result"
            );
            return Ok(FetchOutcome::Stale);
        }
        self.state = FetchState::Idle;
        self.pending_date = None;

        let table = result?.rebase(&self.source)?;
        if !table.contains(&self.target) {
            warn!(target_currency = %self.target, date = %table.date(), "Target currency missing from table");
        }

        let published = table.date();
        debug!(request_id = request.id, %published, "Fetch applied");
        self.table = Some(table);
        self.loaded_request = request.date;
        Ok(FetchOutcome::Applied {
            requested: request.date,
            published,
        })
    }

    /// Runs `request` against `provider` and applies the result.
    pub async fn refresh(
        &mut self,
        provider: &dyn RatesProvider,
        request: FetchRequest,
    ) -> Result<FetchOutcome> {
        let result = request.execute(provider).await;
        self.apply_fetch(&request, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Datelike;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn eur_table_on(date: NaiveDate, usd: f64) -> RateTable {
        let rates = BTreeMap::from([
            ("USD".to_string(), usd),
            ("GBP".to_string(), 0.9),
            ("JPY".to_string(), 160.0),
        ]);
        RateTable::new(date, "EUR", rates).unwrap()
    }

    struct MockProvider {
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RatesProvider for MockProvider {
        async fn fetch_latest(&self) -> Result<RateTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(eur_table_on(day(5), 1.1))
        }

        async fn fetch_by_date(&self, date: NaiveDate, base: &str) -> Result<RateTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if date == day(1) {
                return Err(FxError::NotFound {
                    date: date.to_string(),
                    base: base.to_string(),
                });
            }
            eur_table_on(date, 1.0 + f64::from(date.day0()) / 100.0).rebase(base)
        }
    }

    async fn loaded_session() -> ConverterSession {
        let mut session = ConverterSession::new("EUR", "USD", 10.0).unwrap();
        let request = session.begin_latest();
        session
            .refresh(&MockProvider::new(), request)
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_latest_load_populates_derived_fields() {
        let session = loaded_session().await;

        assert_eq!(session.state(), FetchState::Idle);
        assert_eq!(session.date(), Some(day(5)));
        assert_eq!(session.source_currencies(), vec!["EUR", "GBP", "JPY", "USD"]);
        assert_eq!(session.target_currencies(), vec!["GBP", "JPY", "USD"]);
        assert!((session.target_amount().unwrap() - 11.0).abs() < 1e-9);
        assert_eq!(session.rows().len(), 3);
    }

    #[tokio::test]
    async fn test_set_source_rebases_and_flips_target() {
        let mut session = loaded_session().await;

        session.set_source("usd").unwrap();
        assert_eq!(session.source(), "USD");
        assert_eq!(session.target(), "EUR");
        assert_eq!(session.table().unwrap().base(), "USD");
        assert!((session.target_amount().unwrap() - 10.0 / 1.1).abs() < 1e-9);

        session.set_source("GBP").unwrap();
        assert_eq!(session.source(), "GBP");
        assert_eq!(session.target(), "EUR");
        assert!(!session.target_currencies().contains(&"GBP".to_string()));
    }

    #[tokio::test]
    async fn test_swap_exchanges_pair() {
        let mut session = loaded_session().await;
        session.swap().unwrap();
        assert_eq!((session.source(), session.target()), ("USD", "EUR"));
        session.swap().unwrap();
        assert_eq!((session.source(), session.target()), ("EUR", "USD"));
        assert!((session.target_amount().unwrap() - 11.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_invalid_actions_leave_state_untouched() {
        let mut session = loaded_session().await;

        assert!(matches!(
            session.set_source("CHF"),
            Err(FxError::InvalidBase { .. })
        ));
        assert!(matches!(
            session.set_target("EUR"),
            Err(FxError::Validation(_))
        ));
        assert!(matches!(
            session.set_amount(-5.0),
            Err(FxError::Validation(_))
        ));
        assert!(matches!(
            session.set_date("2024-02-30"),
            Err(FxError::Validation(_))
        ));
        assert!(matches!(
            session.set_date("2999-01-01"),
            Err(FxError::Validation(_))
        ));

        assert_eq!(session.source(), "EUR");
        assert_eq!(session.target(), "USD");
        assert_eq!(session.amount(), 10.0);
        assert_eq!(session.state(), FetchState::Idle);
    }

    #[tokio::test]
    async fn test_same_date_does_not_fetch() {
        let mut session = loaded_session().await;
        assert_eq!(session.set_date("2024-01-05").unwrap(), None);
        assert_eq!(session.state(), FetchState::Idle);
    }

    #[tokio::test]
    async fn test_date_change_fetches_in_current_source() {
        let provider = MockProvider::new();
        let mut session = loaded_session().await;
        session.set_source("GBP").unwrap();

        let request = session.set_date("2024-01-03").unwrap().unwrap();
        assert_eq!(request.base, "GBP");
        assert_eq!(request.date, Some(day(3)));
        assert_eq!(
            session.state(),
            FetchState::Fetching {
                request_id: request.id
            }
        );

        let outcome = session.refresh(&provider, request).await.unwrap();
        assert_eq!(
            outcome,
            FetchOutcome::Applied {
                requested: Some(day(3)),
                published: day(3)
            }
        );
        assert_eq!(session.table().unwrap().base(), "GBP");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_result_is_discarded() {
        let mut session = loaded_session().await;

        let first = session.set_date("2024-01-02").unwrap().unwrap();
        let second = session.set_date("2024-01-03").unwrap().unwrap();

        let outcome = session
            .apply_fetch(&second, Ok(eur_table_on(day(3), 1.3)))
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::Applied { .. }));

        // The older response arrives late and must not win
        let outcome = session
            .apply_fetch(&first, Ok(eur_table_on(day(2), 1.2)))
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Stale);
        assert_eq!(session.date(), Some(day(3)));

        // Stale errors are dropped too
        let outcome = session
            .apply_fetch(&first, Err(FxError::Network("boom".into())))
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Stale);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_table() {
        let provider = MockProvider::new();
        let mut session = loaded_session().await;
        let before = session.table().cloned();

        let request = session.set_date("2024-01-01").unwrap().unwrap();
        let err = session.refresh(&provider, request).await.unwrap_err();

        assert!(matches!(err, FxError::NotFound { .. }));
        assert_eq!(session.state(), FetchState::Idle);
        assert_eq!(session.table().cloned(), before);
        assert!(session.target_amount().is_some());
    }

    #[tokio::test]
    async fn test_result_is_rebased_to_source_changed_mid_flight() {
        let mut session = loaded_session().await;
        let request = session.set_date("2024-01-04").unwrap().unwrap();
        assert_eq!(request.base, "EUR");

        session.set_source("JPY").unwrap();
        session
            .apply_fetch(&request, Ok(eur_table_on(day(4), 1.1)))
            .unwrap();

        let table = session.table().unwrap();
        assert_eq!(table.base(), "JPY");
        assert!((table.rates()["EUR"] - 1.0 / 160.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_returning_to_loaded_date_cancels_pending_fetch() {
        let mut session = loaded_session().await;

        let pending = session.set_date("2024-01-03").unwrap().unwrap();
        assert!(session.is_fetching());

        // Back to the date on screen: nothing new to fetch, old one cancelled
        assert_eq!(session.set_date("2024-01-05").unwrap(), None);
        assert_eq!(session.state(), FetchState::Idle);

        let outcome = session
            .apply_fetch(&pending, Ok(eur_table_on(day(3), 1.3)))
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Stale);
        assert_eq!(session.date(), Some(day(5)));
    }

    #[tokio::test]
    async fn test_same_date_while_fetching_keeps_request() {
        let mut session = loaded_session().await;

        let pending = session.set_date("2024-01-03").unwrap().unwrap();
        assert_eq!(session.set_date("2024-01-03").unwrap(), None);
        assert_eq!(
            session.state(),
            FetchState::Fetching {
                request_id: pending.id
            }
        );

        let outcome = session
            .apply_fetch(&pending, Ok(eur_table_on(day(3), 1.3)))
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::Applied { .. }));
    }

    #[tokio::test]
    async fn test_weekend_date_requested_twice_fetches_once() {
        let mut session = loaded_session().await;

        // Saturday answered with Friday's table
        let request = session.set_date("2024-01-06").unwrap().unwrap();
        session
            .apply_fetch(&request, Ok(eur_table_on(day(5), 1.1)))
            .unwrap();
        assert_eq!(session.date(), Some(day(5)));

        assert_eq!(session.set_date("2024-01-06").unwrap(), None);
        assert_eq!(session.state(), FetchState::Idle);
    }

    #[tokio::test]
    async fn test_future_date_is_judged_in_utc() {
        let mut session = loaded_session().await;
        let today = Utc::now().date_naive();
        let tomorrow = today.succ_opt().unwrap();

        assert!(matches!(
            session.set_date(&tomorrow.to_string()),
            Err(FxError::Validation(_))
        ));
        assert!(session.set_date(&today.to_string()).unwrap().is_some());
    }

    #[test]
    fn test_new_rejects_identical_pair() {
        assert!(ConverterSession::new("EUR", "eur", 1.0).is_err());
        let session = ConverterSession::new("EUR", "USD", 1.0).unwrap();
        assert!(session.rows().is_empty());
        assert!(session.target_amount().is_none());
        assert!(session.source_currencies().is_empty());
    }
}
