//! Product stock ledger.

use chrono::Utc;
use tracing::{info, warn};

use orderdesk_core::{DomainError, DomainResult};
use orderdesk_products::{Product, ProductId, ProductStore};

use crate::alert::{StockAlert, StockAlertBus};

/// Bounded retry count for optimistic-concurrency conflicts.
const DEFAULT_MAX_RETRIES: u32 = 5;

/// The single writer for stock quantities.
///
/// Every mutation is a compare-and-swap against the product's store revision:
/// read, apply the delta, save with the revision the read was taken at. A
/// concurrent writer invalidates the revision and the whole step is retried
/// against fresh state, so concurrent reserve/release on the same product can
/// neither lose updates nor drive stock negative.
pub struct StockLedger<S, A> {
    products: S,
    alerts: A,
    max_retries: u32,
}

impl<S, A> StockLedger<S, A>
where
    S: ProductStore,
    A: StockAlertBus,
{
    pub fn new(products: S, alerts: A) -> Self {
        Self {
            products,
            alerts,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Reserve stock for an order line: atomically decrement by `quantity`.
    ///
    /// Fails with `InsufficientStock` (and no partial decrement) if the
    /// result would drop below zero.
    pub fn reserve(&self, product_id: ProductId, quantity: i64) -> DomainResult<Product> {
        if quantity < 1 {
            return Err(DomainError::InvalidQuantity { quantity });
        }
        self.apply_delta(product_id, -quantity)
    }

    /// Return previously reserved stock: atomically increment by `quantity`.
    pub fn release(&self, product_id: ProductId, quantity: i64) -> DomainResult<Product> {
        if quantity < 1 {
            return Err(DomainError::InvalidQuantity { quantity });
        }
        self.apply_delta(product_id, quantity)
    }

    /// Signed stock adjustment: negative deltas reserve, positive release.
    pub fn adjust(&self, product_id: ProductId, delta: i64) -> DomainResult<Product> {
        if delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }
        self.apply_delta(product_id, delta)
    }

    fn apply_delta(&self, product_id: ProductId, delta: i64) -> DomainResult<Product> {
        let mut attempts = 0;

        loop {
            let read = self.products.load(product_id)?;
            let expected = read.expected();
            let mut product = read.record;

            let available = product.stock();
            if delta < 0 && available + delta < 0 {
                return Err(DomainError::InsufficientStock {
                    product_id: product_id.into(),
                    name: product.name().to_string(),
                    available,
                    requested: -delta,
                });
            }

            product.apply_stock_delta(delta, Utc::now())?;

            match self.products.save(product, expected) {
                Ok(saved) => {
                    let product = saved.record;
                    info!(
                        product_id = %product_id,
                        sku = product.sku(),
                        delta,
                        stock = product.stock(),
                        "stock updated"
                    );
                    self.maybe_alert(&product);
                    return Ok(product);
                }
                Err(DomainError::ConflictingUpdate { .. }) => {
                    attempts += 1;
                    if attempts >= self.max_retries {
                        return Err(DomainError::conflicting_update("product", product_id));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn maybe_alert(&self, product: &Product) {
        if !product.is_low_stock() {
            return;
        }

        warn!(
            product_id = %product.id_typed(),
            sku = product.sku(),
            stock = product.stock(),
            min_stock = product.min_stock(),
            "stock at or below minimum threshold"
        );

        self.alerts.publish(StockAlert {
            product_id: product.id_typed(),
            sku: product.sku().to_string(),
            stock: product.stock(),
            min_stock: product.min_stock(),
            occurred_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use orderdesk_core::{ExpectedRevision, Money, RecordId, Versioned};
    use orderdesk_products::NewProduct;
    use proptest::prelude::*;

    use super::*;
    use crate::alert::InMemoryAlertBus;

    /// Minimal revisioned store; the full adapter lives in the infra crate.
    #[derive(Default)]
    struct TestProductStore {
        rows: Mutex<HashMap<ProductId, Versioned<Product>>>,
    }

    impl TestProductStore {
        fn with_product(product: Product) -> Self {
            let store = Self::default();
            store.insert(product).unwrap();
            store
        }
    }

    impl ProductStore for TestProductStore {
        fn load(&self, id: ProductId) -> DomainResult<Versioned<Product>> {
            self.rows
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::not_found("product", id))
        }

        fn exists(&self, id: ProductId) -> DomainResult<bool> {
            Ok(self.rows.lock().unwrap().contains_key(&id))
        }

        fn insert(&self, product: Product) -> DomainResult<Versioned<Product>> {
            let id = product.id_typed();
            let versioned = Versioned::new(product, 1);
            self.rows.lock().unwrap().insert(id, versioned.clone());
            Ok(versioned)
        }

        fn save(
            &self,
            product: Product,
            expected: ExpectedRevision,
        ) -> DomainResult<Versioned<Product>> {
            let id = product.id_typed();
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found("product", id))?;
            if !expected.matches(row.revision) {
                return Err(DomainError::conflicting_update("product", id));
            }
            row.revision += 1;
            row.record = product;
            Ok(row.clone())
        }

        fn find_by_sku(&self, sku: &str) -> DomainResult<Option<Versioned<Product>>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|v| v.record.sku() == sku)
                .cloned())
        }

        fn list_low_stock(&self) -> DomainResult<Vec<Product>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|v| v.record.is_low_stock())
                .map(|v| v.record.clone())
                .collect())
        }

        fn remove(&self, id: ProductId) -> DomainResult<()> {
            self.rows
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| DomainError::not_found("product", id))
        }
    }

    /// Store whose saves always lose the revision race.
    struct AlwaysConflicting {
        inner: TestProductStore,
    }

    impl ProductStore for AlwaysConflicting {
        fn load(&self, id: ProductId) -> DomainResult<Versioned<Product>> {
            self.inner.load(id)
        }

        fn exists(&self, id: ProductId) -> DomainResult<bool> {
            self.inner.exists(id)
        }

        fn insert(&self, product: Product) -> DomainResult<Versioned<Product>> {
            self.inner.insert(product)
        }

        fn save(
            &self,
            product: Product,
            _expected: ExpectedRevision,
        ) -> DomainResult<Versioned<Product>> {
            Err(DomainError::conflicting_update(
                "product",
                product.id_typed(),
            ))
        }

        fn find_by_sku(&self, sku: &str) -> DomainResult<Option<Versioned<Product>>> {
            self.inner.find_by_sku(sku)
        }

        fn list_low_stock(&self) -> DomainResult<Vec<Product>> {
            self.inner.list_low_stock()
        }

        fn remove(&self, id: ProductId) -> DomainResult<()> {
            self.inner.remove(id)
        }
    }

    fn test_product(stock: i64, min_stock: i64) -> Product {
        Product::new(
            ProductId::new(RecordId::new()),
            NewProduct {
                sku: "WIDGET-01".to_string(),
                name: "Widget".to_string(),
                unit_price: Money::from_cents(1999),
                stock,
                min_stock,
                active: true,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn ledger_with(
        product: Product,
    ) -> (
        StockLedger<Arc<TestProductStore>, Arc<InMemoryAlertBus>>,
        Arc<TestProductStore>,
        Arc<InMemoryAlertBus>,
    ) {
        let store = Arc::new(TestProductStore::with_product(product));
        let alerts = Arc::new(InMemoryAlertBus::new());
        (
            StockLedger::new(store.clone(), alerts.clone()),
            store,
            alerts,
        )
    }

    #[test]
    fn reserve_decrements_stock() {
        let product = test_product(10, 0);
        let id = product.id_typed();
        let (ledger, _store, _alerts) = ledger_with(product);

        let updated = ledger.reserve(id, 2).unwrap();
        assert_eq!(updated.stock(), 8);
    }

    #[test]
    fn reserve_beyond_available_fails_without_partial_decrement() {
        let product = test_product(10, 0);
        let id = product.id_typed();
        let (ledger, store, _alerts) = ledger_with(product);

        let err = ledger.reserve(id, 12).unwrap_err();
        match err {
            DomainError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 10);
                assert_eq!(requested, 12);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(store.load(id).unwrap().record.stock(), 10);
    }

    #[test]
    fn release_increments_stock() {
        let product = test_product(3, 0);
        let id = product.id_typed();
        let (ledger, _store, _alerts) = ledger_with(product);

        let updated = ledger.release(id, 4).unwrap();
        assert_eq!(updated.stock(), 7);
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        let product = test_product(3, 0);
        let id = product.id_typed();
        let (ledger, _store, _alerts) = ledger_with(product);

        assert!(matches!(
            ledger.reserve(id, 0),
            Err(DomainError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            ledger.release(id, -1),
            Err(DomainError::InvalidQuantity { .. })
        ));
        assert!(ledger.adjust(id, 0).is_err());
    }

    #[test]
    fn crossing_the_threshold_emits_an_alert() {
        let product = test_product(4, 3);
        let id = product.id_typed();
        let (ledger, _store, alerts) = ledger_with(product);
        let subscription = alerts.subscribe();

        ledger.reserve(id, 1).unwrap();

        let alert = subscription.try_recv().unwrap();
        assert_eq!(alert.product_id, id);
        assert_eq!(alert.stock, 3);
        assert_eq!(alert.min_stock, 3);
    }

    #[test]
    fn alert_does_not_fire_above_threshold() {
        let product = test_product(10, 3);
        let id = product.id_typed();
        let (ledger, _store, alerts) = ledger_with(product);
        let subscription = alerts.subscribe();

        ledger.reserve(id, 2).unwrap();
        assert!(subscription.try_recv().is_err());
    }

    #[test]
    fn exhausted_retries_surface_conflicting_update() {
        let product = test_product(10, 0);
        let id = product.id_typed();
        let store = AlwaysConflicting {
            inner: TestProductStore::with_product(product),
        };
        let ledger = StockLedger::new(store, InMemoryAlertBus::new()).with_max_retries(3);

        assert!(matches!(
            ledger.reserve(id, 1),
            Err(DomainError::ConflictingUpdate { .. })
        ));
    }

    #[test]
    fn unknown_product_is_not_found() {
        let (ledger, _store, _alerts) = ledger_with(test_product(1, 0));
        let missing = ProductId::new(RecordId::new());

        assert!(matches!(
            ledger.reserve(missing, 1),
            Err(DomainError::NotFound { .. })
        ));
    }

    proptest! {
        /// Stock accounting: after any interleaving of successful reserves
        /// and releases, the final quantity equals
        /// `initial − Σ(reserved) + Σ(released)` and never went negative.
        #[test]
        fn stock_accounting_balances(
            initial in 0i64..500,
            ops in prop::collection::vec((any::<bool>(), 1i64..20), 0..40),
        ) {
            let product = test_product(initial, 0);
            let id = product.id_typed();
            let (ledger, store, _alerts) = ledger_with(product);

            let mut reserved = 0i64;
            let mut released = 0i64;

            for (is_reserve, quantity) in ops {
                if is_reserve {
                    match ledger.reserve(id, quantity) {
                        Ok(_) => reserved += quantity,
                        Err(DomainError::InsufficientStock { .. }) => {}
                        Err(other) => panic!("unexpected error: {other:?}"),
                    }
                } else {
                    ledger.release(id, quantity).unwrap();
                    released += quantity;
                }

                let stock = store.load(id).unwrap().record.stock();
                prop_assert!(stock >= 0);
                prop_assert_eq!(stock, initial - reserved + released);
            }
        }
    }
}
