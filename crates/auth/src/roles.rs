use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use bizauth_core::{Entity, RoleId};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "sales.refund"). The core never
/// interprets them; it only carries them on role records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of an RBAC role in the catalog ("OWNER", "Admin", "Cashier", ...).
///
/// Names are unique within the catalog and compared exactly (case-sensitive):
/// the catalog seeds "OWNER" and "Admin" side by side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog-defined RBAC role: a unique name plus the permissions it grants.
///
/// Seeded externally; read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
}

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: RoleId::new(),
            name: RoleName::new(name),
            permissions: BTreeSet::new(),
        }
    }

    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Cow<'static, str>>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Permission::new));
        self
    }

    pub fn grants(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p.as_str() == permission)
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_are_case_sensitive() {
        assert_ne!(RoleName::new("OWNER"), RoleName::new("Owner"));
    }

    #[test]
    fn permissions_are_deduplicated() {
        let role = Role::new("Cashier").with_permissions(["sales.create", "sales.create", "sales.read"]);
        assert_eq!(role.permissions.len(), 2);
        assert!(role.grants("sales.read"));
        assert!(!role.grants("sales.refund"));
    }
}
