use orderdesk_core::{DomainResult, ExpectedRevision, Versioned};
use orderdesk_customers::{Customer, CustomerId, CustomerStore};

use crate::memory::InMemoryTable;

/// In-memory customer store.
#[derive(Debug)]
pub struct InMemoryCustomerStore {
    table: InMemoryTable<CustomerId, Customer>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self {
            table: InMemoryTable::new("customer"),
        }
    }
}

impl Default for InMemoryCustomerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerStore for InMemoryCustomerStore {
    fn load(&self, id: CustomerId) -> DomainResult<Versioned<Customer>> {
        self.table.get(id)
    }

    fn exists(&self, id: CustomerId) -> DomainResult<bool> {
        self.table.contains(id)
    }

    fn insert(&self, customer: Customer) -> DomainResult<Versioned<Customer>> {
        let id = customer.id_typed();
        self.table.insert(id, customer)
    }

    fn save(
        &self,
        customer: Customer,
        expected: ExpectedRevision,
    ) -> DomainResult<Versioned<Customer>> {
        let id = customer.id_typed();
        self.table.save(id, customer, expected)
    }

    fn find_by_email(&self, email: &str) -> DomainResult<Option<Versioned<Customer>>> {
        Ok(self
            .table
            .scan_versioned(|customer| customer.email() == email)?
            .into_iter()
            .next())
    }

    fn find_by_document(&self, document: &str) -> DomainResult<Option<Versioned<Customer>>> {
        Ok(self
            .table
            .scan_versioned(|customer| customer.document() == document)?
            .into_iter()
            .next())
    }

    fn remove(&self, id: CustomerId) -> DomainResult<()> {
        self.table.remove(id)
    }
}
