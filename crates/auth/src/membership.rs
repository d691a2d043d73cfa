//! Business memberships and the legacy fixed-role tag they carry.

use serde::{Deserialize, Serialize};

use bizauth_core::{BusinessId, Entity, MembershipId, RoleId, UserId};

/// Legacy fixed-role tag stored on every membership.
///
/// Predates the role catalog. Persisted rows may hold values outside the
/// enumeration; those are kept verbatim as [`LegacyRole::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LegacyRole {
    Owner,
    Admin,
    Manager,
    Staff,
    Unrecognized(String),
}

impl LegacyRole {
    pub fn as_str(&self) -> &str {
        match self {
            LegacyRole::Owner => "OWNER",
            LegacyRole::Admin => "ADMIN",
            LegacyRole::Manager => "MANAGER",
            LegacyRole::Staff => "STAFF",
            LegacyRole::Unrecognized(tag) => tag,
        }
    }
}

impl From<&str> for LegacyRole {
    fn from(value: &str) -> Self {
        match value {
            "OWNER" => LegacyRole::Owner,
            "ADMIN" => LegacyRole::Admin,
            "MANAGER" => LegacyRole::Manager,
            "STAFF" => LegacyRole::Staff,
            other => LegacyRole::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for LegacyRole {
    fn from(value: String) -> Self {
        match LegacyRole::from(value.as_str()) {
            LegacyRole::Unrecognized(_) => LegacyRole::Unrecognized(value),
            known => known,
        }
    }
}

impl From<LegacyRole> for String {
    fn from(value: LegacyRole) -> Self {
        match value {
            LegacyRole::Unrecognized(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl core::fmt::Display for LegacyRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's membership in a business.
///
/// # Invariants
/// - Once `rbac_role` is set, the role's name corresponds to `legacy_role`
///   under the role mapping in force when it was bound.
/// - Only the backfill binds and only its reversal clears `rbac_role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessMembership {
    pub id: MembershipId,
    pub business_id: BusinessId,
    pub user_id: UserId,
    pub legacy_role: LegacyRole,
    #[serde(default)]
    pub rbac_role: Option<RoleId>,
}

impl BusinessMembership {
    pub fn new(business_id: BusinessId, user_id: UserId, legacy_role: impl Into<LegacyRole>) -> Self {
        Self {
            id: MembershipId::new(),
            business_id,
            user_id,
            legacy_role: legacy_role.into(),
            rbac_role: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.rbac_role.is_some()
    }

    pub(crate) fn bind(&mut self, role: RoleId) {
        self.rbac_role = Some(role);
    }

    pub(crate) fn unbind(&mut self) -> Option<RoleId> {
        self.rbac_role.take()
    }
}

impl Entity for BusinessMembership {
    type Id = MembershipId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_parse_to_variants() {
        assert_eq!(LegacyRole::from("OWNER"), LegacyRole::Owner);
        assert_eq!(LegacyRole::from("STAFF"), LegacyRole::Staff);
    }

    #[test]
    fn unknown_tags_are_preserved_verbatim() {
        let tag = LegacyRole::from("owner");
        assert_eq!(tag, LegacyRole::Unrecognized("owner".to_string()));
        assert_eq!(tag.as_str(), "owner");
    }

    #[test]
    fn serde_uses_the_raw_tag() {
        let membership = BusinessMembership::new(BusinessId::new(), UserId::new(), "AUDITOR");
        let json = serde_json::to_value(&membership).unwrap();
        assert_eq!(json["legacy_role"], "AUDITOR");
        assert!(json["rbac_role"].is_null());

        let back: BusinessMembership = serde_json::from_value(json).unwrap();
        assert_eq!(back, membership);
    }

    #[test]
    fn missing_rbac_role_field_defaults_to_unbound() {
        let json = serde_json::json!({
            "id": MembershipId::new(),
            "business_id": BusinessId::new(),
            "user_id": UserId::new(),
            "legacy_role": "MANAGER",
        });
        let membership: BusinessMembership = serde_json::from_value(json).unwrap();
        assert_eq!(membership.legacy_role, LegacyRole::Manager);
        assert!(!membership.is_bound());
    }
}
