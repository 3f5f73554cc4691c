//! Record-store port for orders.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use orderdesk_core::{DomainResult, ExpectedRevision, Versioned};
use orderdesk_customers::CustomerId;

use crate::order::{Order, OrderId, OrderStatus};

/// Persistence port; implementations must give each save atomic single-row
/// semantics so that concurrent status transitions on the same order
/// serialize on the revision check.
pub trait OrderStore: Send + Sync {
    fn load(&self, id: OrderId) -> DomainResult<Versioned<Order>>;

    fn insert(&self, order: Order) -> DomainResult<Versioned<Order>>;

    fn save(&self, order: Order, expected: ExpectedRevision) -> DomainResult<Versioned<Order>>;

    fn find_by_status(&self, status: OrderStatus) -> DomainResult<Vec<Order>>;

    fn find_by_customer(&self, customer_id: CustomerId) -> DomainResult<Vec<Order>>;

    /// Orders in `status` created at or before `cutoff`, paired with the
    /// revision each was read at so the sweep can transition them without
    /// clobbering a racing writer.
    fn find_stale(
        &self,
        status: OrderStatus,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<Vec<Versioned<Order>>>;
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn load(&self, id: OrderId) -> DomainResult<Versioned<Order>> {
        (**self).load(id)
    }

    fn insert(&self, order: Order) -> DomainResult<Versioned<Order>> {
        (**self).insert(order)
    }

    fn save(&self, order: Order, expected: ExpectedRevision) -> DomainResult<Versioned<Order>> {
        (**self).save(order, expected)
    }

    fn find_by_status(&self, status: OrderStatus) -> DomainResult<Vec<Order>> {
        (**self).find_by_status(status)
    }

    fn find_by_customer(&self, customer_id: CustomerId) -> DomainResult<Vec<Order>> {
        (**self).find_by_customer(customer_id)
    }

    fn find_stale(
        &self,
        status: OrderStatus,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<Vec<Versioned<Order>>> {
        (**self).find_stale(status, cutoff)
    }
}
