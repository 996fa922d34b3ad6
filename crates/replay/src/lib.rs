pub mod driver;
pub mod error;
pub mod handler;
pub mod ledger;
