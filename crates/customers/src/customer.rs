use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult, Entity, RecordId, ValueObject};

/// Customer identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub RecordId);

impl CustomerId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<CustomerId> for uuid::Uuid {
    fn from(value: CustomerId) -> Self {
        value.0.into()
    }
}

/// Postal address, stored exactly as provided.
///
/// Enrichment by postal code is an external collaborator of the system; this
/// record keeps whatever that collaborator (or the caller) supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl ValueObject for Address {}

/// Input for creating a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub document: String,
    pub address: Option<Address>,
}

/// Partial update of a customer's own attributes; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub document: Option<String>,
    pub address: Option<Address>,
}

/// Entity: Customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    email: String,
    document: String,
    address: Option<Address>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(id: CustomerId, new: NewCustomer, now: DateTime<Utc>) -> DomainResult<Self> {
        validate_name(&new.name)?;
        validate_email(&new.email)?;
        validate_document(&new.document)?;

        Ok(Self {
            id,
            name: new.name,
            email: new.email,
            document: new.document,
            address: new.address,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
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

    /// Apply a partial update; absent fields keep their current value.
    pub fn apply_update(&mut self, update: CustomerUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = update.name {
            validate_name(&name)?;
            self.name = name;
        }
        if let Some(email) = update.email {
            validate_email(&email)?;
            self.email = email;
        }
        if let Some(document) = update.document {
            validate_document(&document)?;
            self.document = document;
        }
        if let Some(address) = update.address {
            self.address = Some(address);
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.updated_at = now;
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    if !email.contains('@') || email.trim().is_empty() {
        return Err(DomainError::validation(format!("malformed email: '{email}'")));
    }
    Ok(())
}

fn validate_document(document: &str) -> DomainResult<()> {
    if document.trim().is_empty() {
        return Err(DomainError::validation("document cannot be empty"));
    }
    Ok(())
}
