//! Rate tables and the arithmetic over them.

use super::error::{FxError, Result};
use super::table::CurrencyTableRow;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Normalizes user input into an ISO 4217 style code ("usd " -> "USD").
pub fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(FxError::validation(format!(
            "'{code}' is not a three letter currency code"
        )));
    }
    Ok(code)
}

/// Multiplies an amount by the rate of the target currency.
pub fn convert_amount(amount: f64, rate: f64) -> f64 {
    amount * rate
}

/// Exchange rates for one day, expressed as units of each currency per one
/// unit of `base`. The base never appears in `rates`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    date: NaiveDate,
    base: String,
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    pub fn new(date: NaiveDate, base: &str, mut rates: BTreeMap<String, f64>) -> Result<Self> {
        let base = normalize_code(base)?;
        rates.remove(&base);

        if let Some((code, rate)) = rates.iter().find(|(_, r)| !(r.is_finite() && **r > 0.0)) {
            return Err(FxError::validation(format!(
                "rate for {code} must be a positive number, got {rate}"
            )));
        }

        Ok(RateTable { date, base, rates })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn rates(&self) -> &BTreeMap<String, f64> {
        &self.rates
    }

    /// Rate of `code` per unit of base; the base itself is 1.0.
    pub fn rate(&self, code: &str) -> Option<f64> {
        if code == self.base {
            Some(1.0)
        } else {
            self.rates.get(code).copied()
        }
    }

    /// True when `code` is the base or one of the listed currencies.
    pub fn contains(&self, code: &str) -> bool {
        self.rate(code).is_some()
    }

    /// Re-expresses the table relative to `new_base`.
    ///
    /// The old base becomes a regular entry at `1 / rates[new_base]` and every
    /// other entry is divided by `rates[new_base]`. Rebasing onto the current
    /// base returns an identical table.
    pub fn rebase(&self, new_base: &str) -> Result<RateTable> {
        if new_base == self.base {
            return Ok(self.clone());
        }

        let pivot = *self
            .rates
            .get(new_base)
            .ok_or_else(|| FxError::InvalidBase {
                requested: new_base.to_string(),
                base: self.base.clone(),
            })?;

        let mut rates: BTreeMap<String, f64> = self
            .rates
            .iter()
            .filter(|(code, _)| code.as_str() != new_base)
            .map(|(code, rate)| (code.clone(), rate / pivot))
            .collect();
        rates.insert(self.base.clone(), 1.0 / pivot);

        Ok(RateTable {
            date: self.date,
            base: new_base.to_string(),
            rates,
        })
    }

    /// Converts `amount` of `source` into `target`. The table must already be
    /// based on `source`; callers rebase first.
    pub fn convert(&self, source: &str, target: &str, amount: f64) -> Result<f64> {
        if source != self.base {
            return Err(FxError::InvalidBase {
                requested: source.to_string(),
                base: self.base.clone(),
            });
        }
        validate_amount(amount)?;

        let rate = self
            .rate(target)
            .ok_or_else(|| FxError::validation(format!("unknown currency {target}")))?;
        Ok(convert_amount(amount, rate))
    }

    /// One row per listed currency, in code order.
    pub fn rows(&self) -> Vec<CurrencyTableRow> {
        self.rates
            .iter()
            .map(|(code, value)| CurrencyTableRow {
                code: code.clone(),
                value: *value,
            })
            .collect()
    }
}

pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(FxError::validation(format!(
            "amount must be a non-negative number, got {amount}"
        )));
    }
    Ok(())
}
