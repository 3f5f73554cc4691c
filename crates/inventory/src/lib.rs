//! `orderdesk-inventory` — the product stock ledger.
//!
//! The ledger is the single point of truth for stock mutation: every
//! reservation and release goes through its atomic compare-and-swap path,
//! never through a read-then-write somewhere else.

pub mod alert;
pub mod ledger;

pub use alert::{AlertSubscription, InMemoryAlertBus, StockAlert, StockAlertBus};
pub use ledger::StockLedger;
