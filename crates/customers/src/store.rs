//! Record-store port for customers.

use std::sync::Arc;

use orderdesk_core::{DomainResult, ExpectedRevision, Versioned};

use crate::customer::{Customer, CustomerId};

/// Persistence port; implementations must give each save atomic
/// single-row semantics.
pub trait CustomerStore: Send + Sync {
    fn load(&self, id: CustomerId) -> DomainResult<Versioned<Customer>>;

    fn exists(&self, id: CustomerId) -> DomainResult<bool>;

    fn insert(&self, customer: Customer) -> DomainResult<Versioned<Customer>>;

    fn save(
        &self,
        customer: Customer,
        expected: ExpectedRevision,
    ) -> DomainResult<Versioned<Customer>>;

    fn find_by_email(&self, email: &str) -> DomainResult<Option<Versioned<Customer>>>;

    fn find_by_document(&self, document: &str) -> DomainResult<Option<Versioned<Customer>>>;

    fn remove(&self, id: CustomerId) -> DomainResult<()>;
}

impl<S> CustomerStore for Arc<S>
where
    S: CustomerStore + ?Sized,
{
    fn load(&self, id: CustomerId) -> DomainResult<Versioned<Customer>> {
        (**self).load(id)
    }

    fn exists(&self, id: CustomerId) -> DomainResult<bool> {
        (**self).exists(id)
    }

    fn insert(&self, customer: Customer) -> DomainResult<Versioned<Customer>> {
        (**self).insert(customer)
    }

    fn save(
        &self,
        customer: Customer,
        expected: ExpectedRevision,
    ) -> DomainResult<Versioned<Customer>> {
        (**self).save(customer, expected)
    }

    fn find_by_email(&self, email: &str) -> DomainResult<Option<Versioned<Customer>>> {
        (**self).find_by_email(email)
    }

    fn find_by_document(&self, document: &str) -> DomainResult<Option<Versioned<Customer>>> {
        (**self).find_by_document(document)
    }

    fn remove(&self, id: CustomerId) -> DomainResult<()> {
        (**self).remove(id)
    }
}
