//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod error;
pub mod ledger;
pub mod log;
pub mod rate_table;

// Re-export main types for cleaner imports
pub use currency::{Currency, CurrencyConverter};
pub use error::ConversionError;
pub use rate_table::{FetchWindow, RatePair, RateTable};
