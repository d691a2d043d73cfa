//! In-memory store adapters for tests/dev.
//!
//! - No IO
//! - Lock poisoning surfaces as `StoreError::Unavailable`
//! - Deterministic iteration order where callers may observe it

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use subtle::ConstantTimeEq;

use bizauth_core::{AggregateRoot, ExpectedVersion, InvitationId, MembershipId, UserId};

use crate::store::{InvitationStore, MembershipStore, RoleCatalog, StoreError, UserStore};
use crate::{BusinessInvitation, BusinessMembership, EmailAddress, InvitationStatus, Role, Secret, User};

fn poisoned() -> StoreError {
    StoreError::unavailable("lock poisoned")
}

const DECOY_SECRET: &[u8] = b"decoy-credential-never-matches";

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// Users with plain stored secrets, compared in constant time.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, (User, Secret)>>,
    lookups: AtomicUsize,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User, secret: impl Into<Secret>) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        users.insert(user.id, (user, secret.into()));
        Ok(())
    }

    /// Number of `find_by_email` calls served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_email(&self, email: &EmailAddress) -> Result<Vec<User>, StoreError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users
            .values()
            .filter(|(user, _)| user.email == *email)
            .map(|(user, _)| user.clone())
            .collect())
    }

    fn verify_secret(&self, user: &User, presented: &Secret) -> Result<bool, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        let Some((_, stored)) = users.get(&user.id) else {
            return Ok(false);
        };
        Ok(stored
            .expose()
            .as_bytes()
            .ct_eq(presented.expose().as_bytes())
            .into())
    }

    fn verify_decoy(&self, presented: &Secret) {
        let _: bool = DECOY_SECRET.ct_eq(presented.expose().as_bytes()).into();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────────────────────────────────────

/// Role catalog keyed by exact role name.
#[derive(Debug, Default)]
pub struct InMemoryRoleCatalog {
    roles: RwLock<HashMap<String, Role>>,
}

impl InMemoryRoleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        let catalog = Self::new();
        if let Ok(mut map) = catalog.roles.write() {
            for role in roles {
                map.insert(role.name.as_str().to_string(), role);
            }
        }
        catalog
    }

    pub fn seed(&self, role: Role) -> Result<(), StoreError> {
        let mut roles = self.roles.write().map_err(|_| poisoned())?;
        roles.insert(role.name.as_str().to_string(), role);
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<Role>, StoreError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        let mut list: Vec<Role> = roles.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }
}

impl RoleCatalog for InMemoryRoleCatalog {
    fn find_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        Ok(roles.get(name).cloned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memberships
// ─────────────────────────────────────────────────────────────────────────────

/// Memberships ordered by id; counts writes so callers can assert idempotence.
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    memberships: RwLock<BTreeMap<MembershipId, BusinessMembership>>,
    saves: AtomicUsize,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memberships(memberships: impl IntoIterator<Item = BusinessMembership>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.memberships.write() {
            for membership in memberships {
                map.insert(membership.id, membership);
            }
        }
        store
    }

    pub fn get(&self, id: MembershipId) -> Result<Option<BusinessMembership>, StoreError> {
        let memberships = self.memberships.read().map_err(|_| poisoned())?;
        Ok(memberships.get(&id).cloned())
    }

    /// Number of `save` calls served so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl MembershipStore for InMemoryMembershipStore {
    fn list_all(&self) -> Result<Vec<BusinessMembership>, StoreError> {
        let memberships = self.memberships.read().map_err(|_| poisoned())?;
        Ok(memberships.values().cloned().collect())
    }

    fn save(&self, membership: &BusinessMembership) -> Result<(), StoreError> {
        let mut memberships = self.memberships.write().map_err(|_| poisoned())?;
        memberships.insert(membership.id, membership.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Invitations
// ─────────────────────────────────────────────────────────────────────────────

/// Invitations with a compare-and-set on `version`.
#[derive(Debug, Default)]
pub struct InMemoryInvitationStore {
    invitations: Mutex<HashMap<InvitationId, BusinessInvitation>>,
}

impl InMemoryInvitationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly issued invitation.
    pub fn insert(&self, invitation: BusinessInvitation) -> Result<InvitationId, StoreError> {
        let id = invitation.id_typed();
        self.save(&invitation, ExpectedVersion::Any)?;
        Ok(id)
    }
}

impl InvitationStore for InMemoryInvitationStore {
    fn get(&self, id: InvitationId) -> Result<Option<BusinessInvitation>, StoreError> {
        let invitations = self.invitations.lock().map_err(|_| poisoned())?;
        Ok(invitations.get(&id).cloned())
    }

    fn save(
        &self,
        invitation: &BusinessInvitation,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut invitations = self.invitations.lock().map_err(|_| poisoned())?;
        let id = invitation.id_typed();

        match invitations.get(&id) {
            Some(stored) if !expected.matches(stored.version()) => {
                return Err(StoreError::Conflict {
                    expected,
                    actual: stored.version(),
                });
            }
            None if expected != ExpectedVersion::Any => {
                return Err(StoreError::NotFound(format!("invitation {id}")));
            }
            _ => {}
        }

        invitations.insert(id, invitation.clone());
        Ok(())
    }

    fn list_pending(&self) -> Result<Vec<BusinessInvitation>, StoreError> {
        let invitations = self.invitations.lock().map_err(|_| poisoned())?;
        let mut pending: Vec<BusinessInvitation> = invitations
            .values()
            .filter(|i| i.status() == InvitationStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|i| i.created_at());
        Ok(pending)
    }
}
