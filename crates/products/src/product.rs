use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult, Entity, Money, RecordId};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub RecordId);

impl ProductId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<ProductId> for uuid::Uuid {
    fn from(value: ProductId) -> Self {
        value.0.into()
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub stock: i64,
    pub min_stock: i64,
    pub active: bool,
}

/// Partial update of catalog attributes; `None` leaves a field as is.
///
/// Deliberately has no stock field: stock moves only through the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub unit_price: Option<Money>,
    pub min_stock: Option<i64>,
    pub active: Option<bool>,
}

/// Entity: Product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    /// Gross unit price; order items snapshot this at order time.
    unit_price: Money,
    /// Available quantity; never negative.
    stock: i64,
    min_stock: i64,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(id: ProductId, new: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        validate_sku(&new.sku)?;
        validate_name(&new.name)?;
        if new.unit_price.is_negative() {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        if new.stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        if new.min_stock < 0 {
            return Err(DomainError::validation("minimum stock cannot be negative"));
        }

        Ok(Self {
            id,
            sku: new.sku,
            name: new.name,
            unit_price: new.unit_price,
            stock: new.stock,
            min_stock: new.min_stock,
            active: new.active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn min_stock(&self) -> i64 {
        self.min_stock
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Stock at or below the configured minimum threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Apply a signed stock delta, returning the new quantity.
    ///
    /// Callers go through the inventory ledger, which serializes concurrent
    /// deltas per product; the negative guard here is the entity's own
    /// invariant, kept regardless of who calls.
    pub fn apply_stock_delta(&mut self, delta: i64, now: DateTime<Utc>) -> DomainResult<i64> {
        let new_stock = self
            .stock
            .checked_add(delta)
            .ok_or_else(|| DomainError::validation("stock adjustment overflow"))?;
        if new_stock < 0 {
            return Err(DomainError::validation("stock cannot go negative"));
        }
        self.stock = new_stock;
        self.updated_at = now;
        Ok(new_stock)
    }

    /// Apply a partial catalog update; absent fields keep their current value.
    pub fn apply_update(&mut self, update: CatalogUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(sku) = update.sku {
            validate_sku(&sku)?;
            self.sku = sku;
        }
        if let Some(name) = update.name {
            validate_name(&name)?;
            self.name = name;
        }
        if let Some(unit_price) = update.unit_price {
            if unit_price.is_negative() {
                return Err(DomainError::validation("unit price cannot be negative"));
            }
            self.unit_price = unit_price;
        }
        if let Some(min_stock) = update.min_stock {
            if min_stock < 0 {
                return Err(DomainError::validation("minimum stock cannot be negative"));
            }
            self.min_stock = min_stock;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_sku(sku: &str) -> DomainResult<()> {
    if sku.trim().is_empty() {
        return Err(DomainError::validation("sku cannot be empty"));
    }
    Ok(())
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}
