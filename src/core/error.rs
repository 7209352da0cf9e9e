//! Error taxonomy shared by the rate table, providers and session.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FxError {
    /// Rebase or conversion requested against a base the table cannot provide.
    #[error("Invalid base currency {requested}: not listed in the {base} rate table")]
    InvalidBase { requested: String, base: String },

    #[error("Network error: {0}")]
    Network(String),

    /// Upstream has no data, e.g. a date before the feed started.
    #[error("No rates published for {date} (base {base})")]
    NotFound { date: String, base: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl FxError {
    pub fn validation(msg: impl Into<String>) -> Self {
        FxError::Validation(msg.into())
    }
}

pub type Result<T, E = FxError> = std::result::Result<T, E>;
