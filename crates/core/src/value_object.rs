//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value. An email address is the
/// canonical example here: `Alice@Example.com` and `alice@example.com` are the
/// same address, regardless of which record holds them.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
