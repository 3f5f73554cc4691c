//! Order lifecycle orchestration.

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};

use orderdesk_core::{DomainError, DomainResult, Money, RecordId, Versioned};
use orderdesk_customers::{CustomerId, CustomerStore};
use orderdesk_inventory::{StockAlertBus, StockLedger};
use orderdesk_products::{ProductId, ProductStore};

use crate::order::{Order, OrderId, OrderItem, OrderStatus};
use crate::store::OrderStore;

/// Bounded retry count for optimistic-concurrency conflicts on transitions.
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Orders stuck in `created` longer than this are swept to `late`.
const DEFAULT_LATE_THRESHOLD_HOURS: i64 = 48;

/// One requested line of a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub discount: Option<Money>,
}

/// Orchestrates order creation, payment, cancellation, and the overdue
/// sweep. All stock movement goes through the inventory ledger; all status
/// transitions go through a revision-checked save, so two racing calls on
/// the same order serialize and the loser observes the post-transition state.
pub struct OrderService<O, P, C, A> {
    orders: O,
    products: P,
    customers: C,
    ledger: StockLedger<P, A>,
    late_threshold: Duration,
    max_retries: u32,
}

impl<O, P, C, A> OrderService<O, P, C, A>
where
    O: OrderStore,
    P: ProductStore,
    C: CustomerStore,
    A: StockAlertBus,
{
    pub fn new(orders: O, products: P, customers: C, ledger: StockLedger<P, A>) -> Self {
        Self {
            orders,
            products,
            customers,
            ledger,
            late_threshold: Duration::hours(DEFAULT_LATE_THRESHOLD_HOURS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_late_threshold(mut self, threshold: Duration) -> Self {
        self.late_threshold = threshold;
        self
    }

    pub fn late_threshold(&self) -> Duration {
        self.late_threshold
    }

    /// Create an order from a non-empty sequence of item requests.
    ///
    /// All-or-nothing from the caller's perspective: if any request fails,
    /// reservations already taken for earlier requests are returned before
    /// the error propagates.
    pub fn create_order(
        &self,
        customer_id: CustomerId,
        requests: &[OrderItemRequest],
    ) -> DomainResult<Order> {
        if requests.is_empty() {
            return Err(DomainError::validation("order requires at least one item"));
        }
        if !self.customers.exists(customer_id)? {
            return Err(DomainError::not_found("customer", customer_id));
        }

        let mut items = Vec::with_capacity(requests.len());
        let mut reserved: Vec<(ProductId, i64)> = Vec::new();

        for request in requests {
            match self.prepare_item(request) {
                Ok(item) => {
                    reserved.push((request.product_id, request.quantity));
                    items.push(item);
                }
                Err(e) => {
                    self.roll_back_reservations(&reserved);
                    return Err(e);
                }
            }
        }

        let order = Order::place(
            OrderId::new(RecordId::new()),
            customer_id,
            items,
            Utc::now(),
        );
        let order = match order {
            Ok(order) => order,
            Err(e) => {
                self.roll_back_reservations(&reserved);
                return Err(e);
            }
        };

        let stored = match self.orders.insert(order) {
            Ok(stored) => stored,
            Err(e) => {
                self.roll_back_reservations(&reserved);
                return Err(e);
            }
        };

        info!(
            order_id = %stored.record.id_typed(),
            customer_id = %customer_id,
            total = %stored.record.total(),
            "order created"
        );
        Ok(stored.record)
    }

    fn prepare_item(&self, request: &OrderItemRequest) -> DomainResult<OrderItem> {
        let product = self.products.load(request.product_id)?.record;

        // Early exit while nothing has been mutated yet; the atomic reserve
        // below is the actual safety boundary against concurrent creations.
        if product.stock() < request.quantity {
            return Err(DomainError::InsufficientStock {
                product_id: request.product_id.into(),
                name: product.name().to_string(),
                available: product.stock(),
                requested: request.quantity,
            });
        }

        let item = OrderItem::new(&product, request.quantity, request.discount)?;
        self.ledger.reserve(request.product_id, request.quantity)?;
        Ok(item)
    }

    /// Best-effort compensation for a creation that failed partway.
    fn roll_back_reservations(&self, reserved: &[(ProductId, i64)]) {
        for &(product_id, quantity) in reserved {
            if let Err(e) = self.ledger.release(product_id, quantity) {
                error!(
                    product_id = %product_id,
                    quantity,
                    error = %e,
                    "failed to roll back reservation"
                );
            }
        }
    }

    /// `created → paid`. No stock effect.
    pub fn pay_order(&self, id: OrderId) -> DomainResult<Order> {
        let saved = self.transition(id, |order, now| order.pay(now))?;
        info!(order_id = %id, "order paid");
        Ok(saved.record)
    }

    /// `created → cancelled` or `late → cancelled`, returning reserved stock.
    ///
    /// The status is claimed first through the revision-checked save, so of
    /// two racing cancels exactly one wins and stock is released exactly
    /// once. If releasing then fails partway, the already-released items stay
    /// released and the order stays cancelled; the partial failure is
    /// surfaced as `ReleaseIncomplete` instead of being swallowed.
    pub fn cancel_order(&self, id: OrderId) -> DomainResult<Order> {
        let saved = self.transition(id, |order, now| order.cancel(now))?;
        let order = saved.record;

        let mut failures = Vec::new();
        for item in order.items() {
            if let Err(e) = self.ledger.release(item.product_id(), item.quantity()) {
                error!(
                    order_id = %id,
                    product_id = %item.product_id(),
                    quantity = item.quantity(),
                    error = %e,
                    "stock release failed during cancellation"
                );
                failures.push(format!("product {}: {e}", item.product_id()));
            }
        }

        if !failures.is_empty() {
            return Err(DomainError::ReleaseIncomplete {
                order_id: id.into(),
                detail: failures.join("; "),
            });
        }

        info!(order_id = %id, "order cancelled");
        Ok(order)
    }

    pub fn get_order(&self, id: OrderId) -> DomainResult<Order> {
        Ok(self.orders.load(id)?.record)
    }

    pub fn list_by_status(&self, status: OrderStatus) -> DomainResult<Vec<Order>> {
        self.orders.find_by_status(status)
    }

    pub fn list_by_customer(&self, customer_id: CustomerId) -> DomainResult<Vec<Order>> {
        if !self.customers.exists(customer_id)? {
            return Err(DomainError::not_found("customer", customer_id));
        }
        self.orders.find_by_customer(customer_id)
    }

    /// Find orders stuck in `created` past the late threshold and mark them
    /// `late`. Touches no stock, loses races silently, and is idempotent:
    /// a second run right after a successful one transitions nothing.
    ///
    /// Returns the number of orders transitioned.
    pub fn run_overdue_sweep(&self) -> DomainResult<usize> {
        self.sweep_overdue_at(Utc::now())
    }

    pub fn sweep_overdue_at(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let cutoff = now - self.late_threshold;
        let stale = self.orders.find_stale(OrderStatus::Created, cutoff)?;
        if stale.is_empty() {
            return Ok(0);
        }

        info!(count = stale.len(), "processing overdue orders");

        let mut transitioned = 0;
        for read in stale {
            let expected = read.expected();
            let mut order = read.record;
            let id = order.id_typed();

            if !order.mark_overdue(now) {
                continue;
            }

            match self.orders.save(order, expected) {
                Ok(_) => {
                    info!(order_id = %id, "order marked late");
                    transitioned += 1;
                }
                // A pay or cancel got there first; the sweep loses silently.
                Err(DomainError::ConflictingUpdate { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(transitioned)
    }

    fn transition<F>(&self, id: OrderId, apply: F) -> DomainResult<Versioned<Order>>
    where
        F: Fn(&mut Order, DateTime<Utc>) -> DomainResult<()>,
    {
        let mut attempts = 0;

        loop {
            let read = self.orders.load(id)?;
            let expected = read.expected();
            let mut order = read.record;

            // Guard against the freshest state we have; a racing writer that
            // beat us to a terminal status makes this fail with
            // InvalidTransition on the retry pass.
            apply(&mut order, Utc::now())?;

            match self.orders.save(order, expected) {
                Ok(saved) => return Ok(saved),
                Err(DomainError::ConflictingUpdate { .. }) => {
                    attempts += 1;
                    if attempts >= self.max_retries {
                        return Err(DomainError::conflicting_update("order", id));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
