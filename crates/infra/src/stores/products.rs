use orderdesk_core::{DomainResult, ExpectedRevision, Versioned};
use orderdesk_products::{Product, ProductId, ProductStore};

use crate::memory::InMemoryTable;

/// In-memory product store.
#[derive(Debug)]
pub struct InMemoryProductStore {
    table: InMemoryTable<ProductId, Product>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            table: InMemoryTable::new("product"),
        }
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductStore for InMemoryProductStore {
    fn load(&self, id: ProductId) -> DomainResult<Versioned<Product>> {
        self.table.get(id)
    }

    fn exists(&self, id: ProductId) -> DomainResult<bool> {
        self.table.contains(id)
    }

    fn insert(&self, product: Product) -> DomainResult<Versioned<Product>> {
        let id = product.id_typed();
        self.table.insert(id, product)
    }

    fn save(
        &self,
        product: Product,
        expected: ExpectedRevision,
    ) -> DomainResult<Versioned<Product>> {
        let id = product.id_typed();
        self.table.save(id, product, expected)
    }

    fn find_by_sku(&self, sku: &str) -> DomainResult<Option<Versioned<Product>>> {
        Ok(self
            .table
            .scan_versioned(|product| product.sku() == sku)?
            .into_iter()
            .next())
    }

    fn list_low_stock(&self) -> DomainResult<Vec<Product>> {
        self.table.scan(|product| product.is_low_stock())
    }

    fn remove(&self, id: ProductId) -> DomainResult<()> {
        self.table.remove(id)
    }
}
