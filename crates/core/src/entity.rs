//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Memberships, users and roles are entities: two records with the same id
/// are the same record even when their fields differ (e.g. before and after a
/// role binding).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
