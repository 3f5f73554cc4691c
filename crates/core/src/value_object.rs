//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared entirely by their attribute
/// values; two value objects with the same values are the same value. To
/// "modify" one, build a new one. `Money { cents: 100 }` is a value object;
/// `Customer { id, .. }` is an entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
