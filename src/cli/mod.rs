pub mod convert;
pub mod ledger;
pub mod setup;
pub mod ui;
