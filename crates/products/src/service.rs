//! Catalog management.

use chrono::Utc;
use tracing::info;

use orderdesk_core::{DomainError, DomainResult, RecordId};

use crate::product::{CatalogUpdate, NewProduct, Product, ProductId};
use crate::store::ProductStore;

/// Bounded retry count when a catalog save races a concurrent stock update.
const MAX_SAVE_RETRIES: u32 = 5;

/// SKU-uniqueness-checked CRUD over the product store.
///
/// Stock quantities are out of bounds here; they move only through the
/// inventory ledger.
pub struct CatalogService<S> {
    products: S,
}

impl<S: ProductStore> CatalogService<S> {
    pub fn new(products: S) -> Self {
        Self { products }
    }

    pub fn create(&self, new: NewProduct) -> DomainResult<Product> {
        if self.products.find_by_sku(&new.sku)?.is_some() {
            return Err(DomainError::already_exists("product", "sku", &new.sku));
        }

        let product = Product::new(ProductId::new(RecordId::new()), new, Utc::now())?;
        let stored = self.products.insert(product)?;

        info!(product_id = %stored.record.id_typed(), sku = stored.record.sku(), "product created");
        Ok(stored.record)
    }

    pub fn get(&self, id: ProductId) -> DomainResult<Product> {
        Ok(self.products.load(id)?.record)
    }

    /// Update catalog attributes without clobbering concurrent stock moves:
    /// the save is revision-checked and retried on conflict against a fresh
    /// read, so a racing reservation is never overwritten.
    pub fn update(&self, id: ProductId, update: CatalogUpdate) -> DomainResult<Product> {
        if let Some(sku) = &update.sku {
            if let Some(other) = self.products.find_by_sku(sku)? {
                if other.record.id_typed() != id {
                    return Err(DomainError::already_exists("product", "sku", sku));
                }
            }
        }

        let mut attempts = 0;
        loop {
            let read = self.products.load(id)?;
            let expected = read.expected();
            let mut product = read.record;
            product.apply_update(update.clone(), Utc::now())?;

            match self.products.save(product, expected) {
                Ok(stored) => {
                    info!(product_id = %id, "product updated");
                    return Ok(stored.record);
                }
                Err(DomainError::ConflictingUpdate { .. }) => {
                    attempts += 1;
                    if attempts >= MAX_SAVE_RETRIES {
                        return Err(DomainError::conflicting_update("product", id));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn delete(&self, id: ProductId) -> DomainResult<()> {
        if !self.products.exists(id)? {
            return Err(DomainError::not_found("product", id));
        }
        self.products.remove(id)?;

        info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub fn list_low_stock(&self) -> DomainResult<Vec<Product>> {
        self.products.list_low_stock()
    }
}
