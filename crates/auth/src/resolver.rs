//! Identity resolution: presented credentials → verified user or rejection.

use crate::store::{StoreError, UserStore};
use crate::{Credentials, EmailAddress, User};

/// Resolves presented credentials against a [`UserStore`].
///
/// Injected into the session layer explicitly; there is no global backend
/// registry. Never mutates state, so it is safe to call repeatedly and from
/// many threads.
#[derive(Debug, Clone)]
pub struct IdentityResolver<S> {
    users: S,
}

impl<S> IdentityResolver<S>
where
    S: UserStore,
{
    pub fn new(users: S) -> Self {
        Self { users }
    }

    pub fn users(&self) -> &S {
        &self.users
    }

    /// Authenticate `credentials`.
    ///
    /// Returns `Ok(Some(user))` only when exactly one user matches the
    /// identifier case-insensitively, the secret verifies and the user is
    /// active. Every other outcome is `Ok(None)`, with no indication of which
    /// check failed. `Err` is reserved for store failures.
    pub fn authenticate(&self, credentials: &Credentials) -> Result<Option<User>, StoreError> {
        let (Some(identifier), Some(secret)) =
            (credentials.lookup_identifier(), credentials.presented_secret())
        else {
            tracing::debug!("authentication rejected: incomplete credentials");
            return Ok(None);
        };

        let Ok(email) = EmailAddress::parse(identifier) else {
            return Ok(None);
        };

        let mut matches = self.users.find_by_email(&email)?;
        if matches.len() != 1 {
            if matches.len() > 1 {
                tracing::warn!(
                    candidates = matches.len(),
                    "authentication rejected: identifier matches several accounts"
                );
            }
            self.users.verify_decoy(secret);
            tracing::debug!("authentication rejected");
            return Ok(None);
        }

        let user = matches.remove(0);
        let verified = self.users.verify_secret(&user, secret)?;
        if verified && user.is_active {
            tracing::debug!(user_id = %user.id, "authenticated");
            Ok(Some(user))
        } else {
            tracing::debug!("authentication rejected");
            Ok(None)
        }
    }
}
