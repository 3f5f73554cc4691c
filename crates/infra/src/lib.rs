//! `orderdesk-infra` — adapters and background plumbing.
//!
//! In-memory record stores with atomic single-row update semantics, plus the
//! periodic worker that drives the overdue sweep and the low-stock report.

pub mod memory;
pub mod stores;
pub mod worker;


pub use memory::InMemoryTable;
pub use stores::{InMemoryCustomerStore, InMemoryOrderStore, InMemoryProductStore};
pub use worker::{
    LowStockReportTask, OverdueSweepTask, PeriodicTask, PeriodicWorkerHandle, WorkerConfig,
    WorkerStats, spawn,
};
