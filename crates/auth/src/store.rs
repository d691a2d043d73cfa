//! Store ports consumed by the identity and role-binding core.
//!
//! Implementations live outside the domain logic: `in_memory` for tests/dev,
//! snapshot or database adapters elsewhere. All ports are synchronous and
//! `Send + Sync` so one store can serve concurrent callers.

use std::sync::Arc;

use thiserror::Error;

use bizauth_core::{ExpectedVersion, InvitationId};

use crate::{BusinessInvitation, BusinessMembership, EmailAddress, Role, Secret, User};

/// Infrastructure failure reported by a store.
///
/// Routine "not found" lookups are `Ok(None)` / empty results, never errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("version conflict (expected {expected:?}, actual {actual})")]
    Conflict {
        expected: ExpectedVersion,
        actual: u64,
    },

    #[error("record not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Read-only access to user accounts plus the secret-verification capability.
pub trait UserStore: Send + Sync {
    /// Every user whose email equals `email` case-insensitively.
    ///
    /// More than one result means the store holds ambiguous data; callers
    /// must not pick one.
    fn find_by_email(&self, email: &EmailAddress) -> Result<Vec<User>, StoreError>;

    /// Check a presented secret against the user's stored credential.
    fn verify_secret(&self, user: &User, presented: &Secret) -> Result<bool, StoreError>;

    /// Spend the cost of one verification without a real credential.
    ///
    /// Called when no single user matched, so that a missing identifier costs
    /// about as much as a wrong secret. Stores backed by a slow hash should
    /// hash `presented` against a fixed decoy credential.
    fn verify_decoy(&self, presented: &Secret) {
        let _ = presented;
    }
}

/// Read-only role catalog.
pub trait RoleCatalog: Send + Sync {
    /// The role with exactly this name (case-sensitive), if seeded.
    fn find_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;
}

/// Business memberships.
pub trait MembershipStore: Send + Sync {
    fn list_all(&self) -> Result<Vec<BusinessMembership>, StoreError>;

    /// Persist a single membership (upsert by id).
    fn save(&self, membership: &BusinessMembership) -> Result<(), StoreError>;
}

/// Business invitations, versioned for optimistic concurrency.
pub trait InvitationStore: Send + Sync {
    fn get(&self, id: InvitationId) -> Result<Option<BusinessInvitation>, StoreError>;

    /// Persist `invitation` if the stored copy is still at `expected`.
    ///
    /// `expected` is the version the caller loaded; the stored version becomes
    /// `invitation.version()`. A mismatch yields [`StoreError::Conflict`] and
    /// leaves the stored copy untouched.
    fn save(
        &self,
        invitation: &BusinessInvitation,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;

    /// Every invitation still in `PENDING`.
    fn list_pending(&self) -> Result<Vec<BusinessInvitation>, StoreError>;
}

impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    fn find_by_email(&self, email: &EmailAddress) -> Result<Vec<User>, StoreError> {
        (**self).find_by_email(email)
    }

    fn verify_secret(&self, user: &User, presented: &Secret) -> Result<bool, StoreError> {
        (**self).verify_secret(user, presented)
    }

    fn verify_decoy(&self, presented: &Secret) {
        (**self).verify_decoy(presented)
    }
}

impl<S> RoleCatalog for Arc<S>
where
    S: RoleCatalog + ?Sized,
{
    fn find_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        (**self).find_by_name(name)
    }
}

impl<S> MembershipStore for Arc<S>
where
    S: MembershipStore + ?Sized,
{
    fn list_all(&self) -> Result<Vec<BusinessMembership>, StoreError> {
        (**self).list_all()
    }

    fn save(&self, membership: &BusinessMembership) -> Result<(), StoreError> {
        (**self).save(membership)
    }
}

impl<S> InvitationStore for Arc<S>
where
    S: InvitationStore + ?Sized,
{
    fn get(&self, id: InvitationId) -> Result<Option<BusinessInvitation>, StoreError> {
        (**self).get(id)
    }

    fn save(
        &self,
        invitation: &BusinessInvitation,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        (**self).save(invitation, expected)
    }

    fn list_pending(&self) -> Result<Vec<BusinessInvitation>, StoreError> {
        (**self).list_pending()
    }
}
