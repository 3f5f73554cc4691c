use chrono::{DateTime, Utc};

use orderdesk_core::{DomainResult, ExpectedRevision, Versioned};
use orderdesk_customers::CustomerId;
use orderdesk_orders::{Order, OrderId, OrderStatus, OrderStore};

use crate::memory::InMemoryTable;

/// In-memory order store.
#[derive(Debug)]
pub struct InMemoryOrderStore {
    table: InMemoryTable<OrderId, Order>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            table: InMemoryTable::new("order"),
        }
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn load(&self, id: OrderId) -> DomainResult<Versioned<Order>> {
        self.table.get(id)
    }

    fn insert(&self, order: Order) -> DomainResult<Versioned<Order>> {
        let id = order.id_typed();
        self.table.insert(id, order)
    }

    fn save(&self, order: Order, expected: ExpectedRevision) -> DomainResult<Versioned<Order>> {
        let id = order.id_typed();
        self.table.save(id, order, expected)
    }

    fn find_by_status(&self, status: OrderStatus) -> DomainResult<Vec<Order>> {
        self.table.scan(|order| order.status() == status)
    }

    fn find_by_customer(&self, customer_id: CustomerId) -> DomainResult<Vec<Order>> {
        self.table.scan(|order| order.customer_id() == customer_id)
    }

    fn find_stale(
        &self,
        status: OrderStatus,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<Vec<Versioned<Order>>> {
        self.table
            .scan_versioned(|order| order.status() == status && order.created_at() <= cutoff)
    }
}
