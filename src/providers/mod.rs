pub mod caching;
pub mod frankfurter;
pub mod util;

pub use caching::CachingRatesProvider;
pub use frankfurter::FrankfurterProvider;
