//! In-memory revisioned tables backing the record-store ports.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use uuid::Uuid;

use orderdesk_core::{DomainError, DomainResult, ExpectedRevision, Versioned};

/// A single revisioned table, intended for tests/dev.
///
/// Every mutation runs inside one write-lock section, which is what gives the
/// typed stores their atomic single-row update semantics. The revision check
/// inside that section is the compare-and-swap that the ledger and lifecycle
/// paths retry on: a save presenting a stale revision fails with
/// `ConflictingUpdate` and nothing is written.
#[derive(Debug)]
pub struct InMemoryTable<K, V> {
    resource: &'static str,
    rows: RwLock<HashMap<K, Versioned<V>>>,
}

impl<K, V> InMemoryTable<K, V>
where
    K: Copy + Eq + Hash + Into<Uuid>,
    V: Clone,
{
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            rows: RwLock::new(HashMap::new()),
        }
    }

    fn poisoned(&self) -> DomainError {
        DomainError::validation(format!("{} table lock poisoned", self.resource))
    }

    pub fn get(&self, key: K) -> DomainResult<Versioned<V>> {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        rows.get(&key)
            .cloned()
            .ok_or_else(|| DomainError::not_found(self.resource, key))
    }

    pub fn contains(&self, key: K) -> DomainResult<bool> {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows.contains_key(&key))
    }

    /// Insert a fresh row at revision 1.
    pub fn insert(&self, key: K, value: V) -> DomainResult<Versioned<V>> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        if rows.contains_key(&key) {
            return Err(DomainError::already_exists(
                self.resource,
                "id",
                key.into().to_string(),
            ));
        }
        let row = Versioned::new(value, 1);
        rows.insert(key, row.clone());
        Ok(row)
    }

    /// Conditionally replace a row, bumping its revision.
    pub fn save(&self, key: K, value: V, expected: ExpectedRevision) -> DomainResult<Versioned<V>> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        let row = rows
            .get_mut(&key)
            .ok_or_else(|| DomainError::not_found(self.resource, key))?;

        if !expected.matches(row.revision) {
            return Err(DomainError::conflicting_update(self.resource, key));
        }

        row.revision += 1;
        row.record = value;
        Ok(row.clone())
    }

    pub fn remove(&self, key: K) -> DomainResult<()> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        rows.remove(&key)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(self.resource, key))
    }

    pub fn scan<F>(&self, predicate: F) -> DomainResult<Vec<V>>
    where
        F: Fn(&V) -> bool,
    {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows
            .values()
            .filter(|row| predicate(&row.record))
            .map(|row| row.record.clone())
            .collect())
    }

    pub fn scan_versioned<F>(&self, predicate: F) -> DomainResult<Vec<Versioned<V>>>
    where
        F: Fn(&V) -> bool,
    {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows
            .values()
            .filter(|row| predicate(&row.record))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use orderdesk_core::RecordId;

    use super::*;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    struct Key(RecordId);

    impl From<Key> for Uuid {
        fn from(value: Key) -> Self {
            value.0.into()
        }
    }

    fn table() -> InMemoryTable<Key, String> {
        InMemoryTable::new("widget")
    }

    #[test]
    fn insert_starts_at_revision_one() {
        let table = table();
        let key = Key(RecordId::new());

        let row = table.insert(key, "a".to_string()).unwrap();
        assert_eq!(row.revision, 1);
    }

    #[test]
    fn double_insert_is_already_exists() {
        let table = table();
        let key = Key(RecordId::new());

        table.insert(key, "a".to_string()).unwrap();
        assert!(matches!(
            table.insert(key, "b".to_string()),
            Err(DomainError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn save_bumps_revision_on_match() {
        let table = table();
        let key = Key(RecordId::new());

        table.insert(key, "a".to_string()).unwrap();
        let row = table
            .save(key, "b".to_string(), ExpectedRevision::Exact(1))
            .unwrap();

        assert_eq!(row.revision, 2);
        assert_eq!(row.record, "b");
    }

    #[test]
    fn stale_revision_conflicts_and_writes_nothing() {
        let table = table();
        let key = Key(RecordId::new());

        table.insert(key, "a".to_string()).unwrap();
        table
            .save(key, "b".to_string(), ExpectedRevision::Exact(1))
            .unwrap();

        // A second writer still holding revision 1 must lose.
        assert!(matches!(
            table.save(key, "c".to_string(), ExpectedRevision::Exact(1)),
            Err(DomainError::ConflictingUpdate { .. })
        ));
        assert_eq!(table.get(key).unwrap().record, "b");
    }

    #[test]
    fn any_expectation_skips_the_check() {
        let table = table();
        let key = Key(RecordId::new());

        table.insert(key, "a".to_string()).unwrap();
        table
            .save(key, "b".to_string(), ExpectedRevision::Any)
            .unwrap();
        let row = table
            .save(key, "c".to_string(), ExpectedRevision::Any)
            .unwrap();

        assert_eq!(row.revision, 3);
    }

    #[test]
    fn missing_rows_are_not_found() {
        let table = table();
        let key = Key(RecordId::new());

        assert!(table.get(key).is_err());
        assert!(table
            .save(key, "a".to_string(), ExpectedRevision::Any)
            .is_err());
        assert!(table.remove(key).is_err());
    }
}
