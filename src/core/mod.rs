//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod rates;
pub mod session;
pub mod table;

// Re-export main types for cleaner imports
pub use currency::RatesProvider;
pub use error::FxError;
pub use rates::RateTable;
pub use session::ConverterSession;
pub use table::{CurrencyTableRow, SortColumn, SortDirection, SortDirective};
