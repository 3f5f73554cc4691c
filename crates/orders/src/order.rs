use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult, Entity, Money, RecordId, ValueObject};
use orderdesk_customers::CustomerId;
use orderdesk_products::{Product, ProductId};

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub RecordId);

impl OrderId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<OrderId> for uuid::Uuid {
    fn from(value: OrderId) -> Self {
        value.0.into()
    }
}

/// Order item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderItemId(pub RecordId);

impl OrderItemId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<OrderItemId> for uuid::Uuid {
    fn from(value: OrderItemId) -> Self {
        value.0.into()
    }
}

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Paid,
    Cancelled,
    Late,
}

impl OrderStatus {
    /// Terminal statuses permit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OrderStatus::Created => "created",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Late => "late",
        };
        f.write_str(s)
    }
}

/// Order line: product, quantity, and the unit price captured at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    id: OrderItemId,
    product_id: ProductId,
    quantity: i64,
    unit_price: Money,
    discount: Money,
}

impl OrderItem {
    /// Build a line from a product snapshot.
    ///
    /// The unit price is fixed here: later catalog price changes must not
    /// retroactively affect existing orders. A missing discount defaults to
    /// zero.
    pub fn new(product: &Product, quantity: i64, discount: Option<Money>) -> DomainResult<Self> {
        let discount = discount.unwrap_or(Money::ZERO);

        if quantity < 1 {
            return Err(DomainError::InvalidQuantity { quantity });
        }
        if discount.is_negative() {
            return Err(DomainError::InvalidDiscount { discount });
        }

        Ok(Self {
            id: OrderItemId::new(RecordId::new()),
            product_id: product.id_typed(),
            quantity,
            unit_price: product.unit_price(),
            discount,
        })
    }

    pub fn id_typed(&self) -> OrderItemId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    /// Gross line amount: `unit_price × quantity`, before the discount.
    pub fn gross(&self) -> DomainResult<Money> {
        self.unit_price.checked_mul(self.quantity).ok_or_else(overflow)
    }

    /// `unit_price × quantity − discount`.
    pub fn subtotal(&self) -> DomainResult<Money> {
        self.gross()?.checked_sub(self.discount).ok_or_else(overflow)
    }
}

impl Entity for OrderItem {
    type Id = OrderItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Derived monetary totals of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount_total: Money,
    pub total: Money,
}

impl ValueObject for OrderTotals {}

impl OrderTotals {
    pub const ZERO: OrderTotals = OrderTotals {
        subtotal: Money::ZERO,
        discount_total: Money::ZERO,
        total: Money::ZERO,
    };

    /// Pure function from an item set to totals.
    ///
    /// `subtotal = Σ(unit_price × quantity)`, `discount_total = Σ(discount)`,
    /// `total = subtotal − discount_total`. Exact integer arithmetic, so
    /// recomputing over an unchanged set yields identical values.
    pub fn of(items: &[OrderItem]) -> DomainResult<OrderTotals> {
        let mut subtotal = Money::ZERO;
        let mut discount_total = Money::ZERO;

        for item in items {
            subtotal = subtotal.checked_add(item.gross()?).ok_or_else(overflow)?;
            discount_total = discount_total
                .checked_add(item.discount())
                .ok_or_else(overflow)?;
        }

        let total = subtotal.checked_sub(discount_total).ok_or_else(overflow)?;

        Ok(OrderTotals {
            subtotal,
            discount_total,
            total,
        })
    }
}

fn overflow() -> DomainError {
    DomainError::validation("order amount overflow")
}

/// Entity: Order.
///
/// Owns its items exclusively; totals are recomputed from the item set at
/// every item change and the status follows a small state machine with
/// `paid` and `cancelled` as terminal states. Orders are never hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    items: Vec<OrderItem>,
    totals: OrderTotals,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Place a new order in `created` status with totals computed from the
    /// item set. The item list is fixed once creation completes; the entity
    /// itself still supports add/remove for future item-edit operations.
    pub fn place(
        id: OrderId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("order requires at least one item"));
        }
        let totals = OrderTotals::of(&items)?;

        Ok(Self {
            id,
            customer_id,
            items,
            totals,
            status: OrderStatus::Created,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn subtotal(&self) -> Money {
        self.totals.subtotal
    }

    pub fn discount_total(&self) -> Money {
        self.totals.discount_total
    }

    pub fn total(&self) -> Money {
        self.totals.total
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append a line and recompute totals. Only meaningful before the order
    /// leaves `created`.
    pub fn add_item(&mut self, item: OrderItem, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != OrderStatus::Created {
            return Err(self.invalid_transition("modify"));
        }
        self.items.push(item);
        self.recompute_totals(now)
    }

    /// Detach (and thereby destroy) a line and recompute totals.
    pub fn remove_item(&mut self, item_id: OrderItemId, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != OrderStatus::Created {
            return Err(self.invalid_transition("modify"));
        }
        let position = self
            .items
            .iter()
            .position(|item| item.id_typed() == item_id)
            .ok_or_else(|| DomainError::not_found("order item", item_id))?;
        self.items.remove(position);
        self.recompute_totals(now)
    }

    /// `created → paid`.
    ///
    /// `late` is deliberately not payable; a late order must be cancelled (or
    /// stay late). No stock effect.
    pub fn pay(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != OrderStatus::Created {
            return Err(self.invalid_transition("pay"));
        }
        self.status = OrderStatus::Paid;
        self.updated_at = now;
        Ok(())
    }

    /// `created → cancelled` or `late → cancelled`.
    ///
    /// The stock released on cancellation is the caller's (service's)
    /// responsibility; the entity only guards and flips the status.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if !matches!(self.status, OrderStatus::Created | OrderStatus::Late) {
            return Err(self.invalid_transition("cancel"));
        }
        self.status = OrderStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// `created → late`.
    ///
    /// A no-op (returns `false`) from any other status: the overdue sweep may
    /// lose a race against a concurrent pay or cancel, and losing silently is
    /// the correct outcome, not an error.
    pub fn mark_overdue(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != OrderStatus::Created {
            return false;
        }
        self.status = OrderStatus::Late;
        self.updated_at = now;
        true
    }

    fn recompute_totals(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.totals = OrderTotals::of(&self.items)?;
        self.updated_at = now;
        Ok(())
    }

    fn invalid_transition(&self, attempted: &'static str) -> DomainError {
        DomainError::InvalidTransition {
            current: self.status.to_string(),
            attempted,
        }
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use orderdesk_products::NewProduct;
    use proptest::prelude::*;

    use super::*;

    fn test_customer_id() -> CustomerId {
        CustomerId::new(RecordId::new())
    }

    fn test_order_id() -> OrderId {
        OrderId::new(RecordId::new())
    }

    fn test_product(price_cents: i64) -> Product {
        Product::new(
            ProductId::new(RecordId::new()),
            NewProduct {
                sku: "WIDGET-01".to_string(),
                name: "Widget".to_string(),
                unit_price: Money::from_cents(price_cents),
                stock: 100,
                min_stock: 0,
                active: true,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn test_item(price_cents: i64, quantity: i64, discount_cents: i64) -> OrderItem {
        OrderItem::new(
            &test_product(price_cents),
            quantity,
            Some(Money::from_cents(discount_cents)),
        )
        .unwrap()
    }

    fn test_order(items: Vec<OrderItem>) -> Order {
        Order::place(test_order_id(), test_customer_id(), items, Utc::now()).unwrap()
    }

    #[test]
    fn item_snapshots_price_and_computes_subtotal() {
        let product = test_product(1999);
        let item = OrderItem::new(&product, 3, Some(Money::from_cents(97))).unwrap();

        assert_eq!(item.unit_price(), Money::from_cents(1999));
        assert_eq!(item.subtotal().unwrap(), Money::from_cents(5900));
    }

    #[test]
    fn missing_discount_defaults_to_zero() {
        let item = OrderItem::new(&test_product(500), 2, None).unwrap();
        assert_eq!(item.discount(), Money::ZERO);
        assert_eq!(item.subtotal().unwrap(), Money::from_cents(1000));
    }

    #[test]
    fn quantity_below_one_is_rejected() {
        let product = test_product(500);
        assert!(matches!(
            OrderItem::new(&product, 0, None),
            Err(DomainError::InvalidQuantity { quantity: 0 })
        ));
    }

    #[test]
    fn negative_discount_is_rejected() {
        let product = test_product(500);
        assert!(matches!(
            OrderItem::new(&product, 1, Some(Money::from_cents(-1))),
            Err(DomainError::InvalidDiscount { .. })
        ));
    }

    #[test]
    fn totals_sum_gross_and_discounts_separately() {
        let items = vec![test_item(1000, 2, 150), test_item(2500, 1, 0)];
        let totals = OrderTotals::of(&items).unwrap();

        assert_eq!(totals.subtotal, Money::from_cents(4500));
        assert_eq!(totals.discount_total, Money::from_cents(150));
        assert_eq!(totals.total, Money::from_cents(4350));
    }

    #[test]
    fn placing_an_empty_order_is_rejected() {
        let err = Order::place(test_order_id(), test_customer_id(), vec![], Utc::now());
        assert!(err.is_err());
    }

    #[test]
    fn placed_order_starts_created_with_totals() {
        let order = test_order(vec![test_item(1000, 2, 0)]);

        assert_eq!(order.status(), OrderStatus::Created);
        assert_eq!(order.subtotal(), Money::from_cents(2000));
        assert_eq!(order.total(), Money::from_cents(2000));
    }

    #[test]
    fn pay_succeeds_only_from_created() {
        let mut order = test_order(vec![test_item(1000, 1, 0)]);
        order.pay(Utc::now()).unwrap();
        assert_eq!(order.status(), OrderStatus::Paid);

        let err = order.pay(Utc::now()).unwrap_err();
        match err {
            DomainError::InvalidTransition { current, attempted } => {
                assert_eq!(current, "paid");
                assert_eq!(attempted, "pay");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
        assert_eq!(order.status(), OrderStatus::Paid);
    }

    #[test]
    fn late_orders_are_not_payable() {
        let mut order = test_order(vec![test_item(1000, 1, 0)]);
        assert!(order.mark_overdue(Utc::now()));

        assert!(matches!(
            order.pay(Utc::now()),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert_eq!(order.status(), OrderStatus::Late);
    }

    #[test]
    fn cancel_is_allowed_from_created_and_late() {
        let mut order = test_order(vec![test_item(1000, 1, 0)]);
        order.cancel(Utc::now()).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);

        let mut order = test_order(vec![test_item(1000, 1, 0)]);
        order.mark_overdue(Utc::now());
        order.cancel(Utc::now()).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn terminal_statuses_reject_cancel() {
        let mut order = test_order(vec![test_item(1000, 1, 0)]);
        order.pay(Utc::now()).unwrap();
        assert!(order.cancel(Utc::now()).is_err());

        let mut order = test_order(vec![test_item(1000, 1, 0)]);
        order.cancel(Utc::now()).unwrap();
        assert!(order.cancel(Utc::now()).is_err());
    }

    #[test]
    fn mark_overdue_is_a_noop_outside_created() {
        let mut order = test_order(vec![test_item(1000, 1, 0)]);
        order.pay(Utc::now()).unwrap();

        assert!(!order.mark_overdue(Utc::now()));
        assert_eq!(order.status(), OrderStatus::Paid);
    }

    #[test]
    fn item_changes_recompute_totals() {
        let mut order = test_order(vec![test_item(1000, 1, 0)]);
        let extra = test_item(500, 2, 100);
        let extra_id = extra.id_typed();

        order.add_item(extra, Utc::now()).unwrap();
        assert_eq!(order.subtotal(), Money::from_cents(2000));
        assert_eq!(order.discount_total(), Money::from_cents(100));
        assert_eq!(order.total(), Money::from_cents(1900));

        order.remove_item(extra_id, Utc::now()).unwrap();
        assert_eq!(order.total(), Money::from_cents(1000));
    }

    #[test]
    fn items_are_frozen_after_leaving_created() {
        let mut order = test_order(vec![test_item(1000, 1, 0)]);
        order.pay(Utc::now()).unwrap();

        let extra = test_item(500, 1, 0);
        assert!(order.add_item(extra, Utc::now()).is_err());
    }

    #[test]
    fn removing_an_unknown_item_is_not_found() {
        let mut order = test_order(vec![test_item(1000, 1, 0)]);
        let missing = OrderItemId::new(RecordId::new());

        assert!(matches!(
            order.remove_item(missing, Utc::now()),
            Err(DomainError::NotFound { .. })
        ));
    }

    proptest! {
        /// `total == subtotal − discount_total` and
        /// `subtotal == Σ(unit_price × quantity)` for any valid item set,
        /// and recomputation is idempotent.
        #[test]
        fn totals_invariant_holds(
            lines in prop::collection::vec(
                (1i64..10_000, 1i64..50, 0i64..1_000),
                1..12,
            ),
        ) {
            let items: Vec<OrderItem> = lines
                .iter()
                .map(|&(price, quantity, discount)| test_item(price, quantity, discount))
                .collect();

            let totals = OrderTotals::of(&items).unwrap();

            let expected_subtotal: i64 = lines.iter().map(|&(p, q, _)| p * q).sum();
            let expected_discount: i64 = lines.iter().map(|&(_, _, d)| d).sum();

            prop_assert_eq!(totals.subtotal.cents(), expected_subtotal);
            prop_assert_eq!(totals.discount_total.cents(), expected_discount);
            prop_assert_eq!(
                totals.total.cents(),
                totals.subtotal.cents() - totals.discount_total.cents()
            );

            // Recomputation over the unchanged set is exact, no drift.
            prop_assert_eq!(OrderTotals::of(&items).unwrap(), totals);
        }
    }
}
