//! User records as seen by the identity resolver.
//!
//! Users are created and maintained elsewhere; this crate only reads them.

use serde::{Deserialize, Serialize};

use bizauth_core::{Entity, UserId};

use crate::EmailAddress;

/// A user account.
///
/// The secret-verification capability is not part of the record; it lives on
/// the [`UserStore`](crate::store::UserStore) that produced the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    /// Inactive users never authenticate, even with a correct secret.
    pub is_active: bool,
}

impl User {
    pub fn new(email: EmailAddress) -> Self {
        Self {
            id: UserId::new(),
            email,
            is_active: true,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
