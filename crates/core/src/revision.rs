//! Optimistic-revision support for record stores.

use serde::{Deserialize, Serialize};

/// Revision expectation for a conditional save.
///
/// Stores bump a record's revision on every successful save; a save with an
/// `Exact` expectation that no longer matches means a concurrent writer got
/// there first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedRevision {
    /// Skip the revision check (idempotent writes, migrations).
    Any,
    /// Require the stored record to be at an exact revision.
    Exact(u64),
}

impl ExpectedRevision {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedRevision::Any => true,
            ExpectedRevision::Exact(v) => v == actual,
        }
    }
}

/// A record paired with the store revision it was read at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub record: T,
    pub revision: u64,
}

impl<T> Versioned<T> {
    pub fn new(record: T, revision: u64) -> Self {
        Self { record, revision }
    }

    /// The expectation a writer should present to save on top of this read.
    pub fn expected(&self) -> ExpectedRevision {
        ExpectedRevision::Exact(self.revision)
    }
}
