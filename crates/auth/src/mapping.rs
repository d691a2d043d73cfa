//! Legacy tag → catalog role name mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{LegacyRole, RoleName};

/// Immutable mapping from a legacy role tag to the name of the catalog role
/// that replaces it.
///
/// Deserializes from a flat JSON object, e.g.
/// `{"OWNER": "OWNER", "ADMIN": "Admin"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleMapping(BTreeMap<String, String>);

impl RoleMapping {
    /// OWNER→"OWNER", ADMIN→"Admin", MANAGER→"Manager", STAFF→"Cashier".
    pub fn canonical() -> Self {
        Self::from_pairs([
            ("OWNER", "OWNER"),
            ("ADMIN", "Admin"),
            ("MANAGER", "Manager"),
            ("STAFF", "Cashier"),
        ])
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn role_for(&self, tag: &LegacyRole) -> Option<RoleName> {
        self.0
            .get(tag.as_str())
            .map(|name| RoleName::new(name.clone()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for RoleMapping {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_table() {
        let mapping = RoleMapping::canonical();
        assert_eq!(mapping.role_for(&LegacyRole::Owner), Some(RoleName::new("OWNER")));
        assert_eq!(mapping.role_for(&LegacyRole::Admin), Some(RoleName::new("Admin")));
        assert_eq!(mapping.role_for(&LegacyRole::Manager), Some(RoleName::new("Manager")));
        assert_eq!(mapping.role_for(&LegacyRole::Staff), Some(RoleName::new("Cashier")));
    }

    #[test]
    fn unrecognized_tag_has_no_mapping() {
        let mapping = RoleMapping::canonical();
        assert_eq!(mapping.role_for(&LegacyRole::from("AUDITOR")), None);
    }

    #[test]
    fn parses_flat_json_object() {
        let mapping: RoleMapping =
            serde_json::from_str(r#"{"OWNER": "Proprietor", "STAFF": "Clerk"}"#).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.role_for(&LegacyRole::Staff), Some(RoleName::new("Clerk")));
        assert_eq!(mapping.role_for(&LegacyRole::Admin), None);
    }
}
