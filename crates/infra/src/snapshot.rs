//! JSON snapshot of the role catalog and business memberships.
//!
//! The operator binary loads a snapshot into the in-memory stores, runs the
//! backfill against them and writes the result back.
//!
//! ```json
//! {
//!   "roles": [{ "id": "…", "name": "Admin", "permissions": ["sales.read"] }],
//!   "memberships": [{ "id": "…", "business_id": "…", "user_id": "…",
//!                     "legacy_role": "ADMIN", "rbac_role": null }]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use bizauth_auth::in_memory::{InMemoryMembershipStore, InMemoryRoleCatalog};
use bizauth_auth::{BusinessMembership, MembershipStore, Role, StoreError};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub memberships: Vec<BusinessMembership>,
}

impl Snapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            roles = snapshot.roles.len(),
            memberships = snapshot.memberships.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Write the snapshot next to `path` and rename it into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let io_err = |source: std::io::Error| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };

        let json = serde_json::to_vec_pretty(self).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }

    pub fn into_stores(self) -> (InMemoryRoleCatalog, InMemoryMembershipStore) {
        (
            InMemoryRoleCatalog::with_roles(self.roles),
            InMemoryMembershipStore::with_memberships(self.memberships),
        )
    }

    pub fn from_stores(
        catalog: &InMemoryRoleCatalog,
        memberships: &InMemoryMembershipStore,
    ) -> Result<Self, SnapshotError> {
        Ok(Self {
            roles: catalog.list()?,
            memberships: memberships.list_all()?,
        })
    }
}
