//! Customer management.

use chrono::Utc;
use tracing::info;

use orderdesk_core::{DomainError, DomainResult, RecordId};

use crate::customer::{Customer, CustomerId, CustomerUpdate, NewCustomer};
use crate::store::CustomerStore;

/// Uniqueness-checked CRUD over the customer store.
pub struct CustomerService<S> {
    customers: S,
}

impl<S: CustomerStore> CustomerService<S> {
    pub fn new(customers: S) -> Self {
        Self { customers }
    }

    pub fn create(&self, new: NewCustomer) -> DomainResult<Customer> {
        if self.customers.find_by_email(&new.email)?.is_some() {
            return Err(DomainError::already_exists("customer", "email", &new.email));
        }
        if self.customers.find_by_document(&new.document)?.is_some() {
            return Err(DomainError::already_exists(
                "customer",
                "document",
                &new.document,
            ));
        }

        let customer = Customer::new(CustomerId::new(RecordId::new()), new, Utc::now())?;
        let stored = self.customers.insert(customer)?;

        info!(customer_id = %stored.record.id_typed(), "customer created");
        Ok(stored.record)
    }

    pub fn get(&self, id: CustomerId) -> DomainResult<Customer> {
        Ok(self.customers.load(id)?.record)
    }

    pub fn update(&self, id: CustomerId, update: CustomerUpdate) -> DomainResult<Customer> {
        let read = self.customers.load(id)?;
        let expected = read.expected();
        let mut customer = read.record;

        // Uniqueness checks must ignore the customer being updated.
        if let Some(email) = &update.email {
            if let Some(other) = self.customers.find_by_email(email)? {
                if other.record.id_typed() != id {
                    return Err(DomainError::already_exists("customer", "email", email));
                }
            }
        }
        if let Some(document) = &update.document {
            if let Some(other) = self.customers.find_by_document(document)? {
                if other.record.id_typed() != id {
                    return Err(DomainError::already_exists(
                        "customer",
                        "document",
                        document,
                    ));
                }
            }
        }

        customer.apply_update(update, Utc::now())?;
        let stored = self.customers.save(customer, expected)?;

        info!(customer_id = %id, "customer updated");
        Ok(stored.record)
    }

    pub fn delete(&self, id: CustomerId) -> DomainResult<()> {
        if !self.customers.exists(id)? {
            return Err(DomainError::not_found("customer", id));
        }
        self.customers.remove(id)?;

        info!(customer_id = %id, "customer deleted");
        Ok(())
    }
}
