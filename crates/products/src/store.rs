//! Record-store port for products.

use std::sync::Arc;

use orderdesk_core::{DomainResult, ExpectedRevision, Versioned};

use crate::product::{Product, ProductId};

/// Persistence port; implementations must give each save atomic single-row
/// semantics, and the revision check is the compare-and-swap the ledger
/// relies on to serialize concurrent stock mutations.
pub trait ProductStore: Send + Sync {
    fn load(&self, id: ProductId) -> DomainResult<Versioned<Product>>;

    fn exists(&self, id: ProductId) -> DomainResult<bool>;

    fn insert(&self, product: Product) -> DomainResult<Versioned<Product>>;

    fn save(
        &self,
        product: Product,
        expected: ExpectedRevision,
    ) -> DomainResult<Versioned<Product>>;

    fn find_by_sku(&self, sku: &str) -> DomainResult<Option<Versioned<Product>>>;

    /// Products whose stock sits at or below their minimum threshold.
    fn list_low_stock(&self) -> DomainResult<Vec<Product>>;

    fn remove(&self, id: ProductId) -> DomainResult<()>;
}

impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    fn load(&self, id: ProductId) -> DomainResult<Versioned<Product>> {
        (**self).load(id)
    }

    fn exists(&self, id: ProductId) -> DomainResult<bool> {
        (**self).exists(id)
    }

    fn insert(&self, product: Product) -> DomainResult<Versioned<Product>> {
        (**self).insert(product)
    }

    fn save(
        &self,
        product: Product,
        expected: ExpectedRevision,
    ) -> DomainResult<Versioned<Product>> {
        (**self).save(product, expected)
    }

    fn find_by_sku(&self, sku: &str) -> DomainResult<Option<Versioned<Product>>> {
        (**self).find_by_sku(sku)
    }

    fn list_low_stock(&self) -> DomainResult<Vec<Product>> {
        (**self).list_low_stock()
    }

    fn remove(&self, id: ProductId) -> DomainResult<()> {
        (**self).remove(id)
    }
}
