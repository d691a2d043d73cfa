//! Environment-driven configuration for the backfill tooling.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use thiserror::Error;

use bizauth_auth::RoleMapping;

pub const ROLE_MAPPING_VAR: &str = "BIZAUTH_ROLE_MAPPING";
pub const BACKFILL_WORKERS_VAR: &str = "BIZAUTH_BACKFILL_WORKERS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read role mapping {path}: {source}")]
    ReadMapping {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("role mapping {path} is not a JSON object of strings: {source}")]
    ParseMapping {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("BIZAUTH_BACKFILL_WORKERS must be a positive integer, got {0:?}")]
    InvalidWorkers(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillConfig {
    pub mapping: RoleMapping,
    pub workers: NonZeroUsize,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            mapping: RoleMapping::canonical(),
            workers: NonZeroUsize::MIN,
        }
    }
}

impl BackfillConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mapping = match lookup(ROLE_MAPPING_VAR).filter(|v| !v.trim().is_empty()) {
            Some(path) => load_mapping(PathBuf::from(path))?,
            None => RoleMapping::canonical(),
        };

        let workers = match lookup(BACKFILL_WORKERS_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|_| ConfigError::InvalidWorkers(raw))?,
            None => NonZeroUsize::MIN,
        };

        Ok(Self { mapping, workers })
    }
}

fn load_mapping(path: PathBuf) -> Result<RoleMapping, ConfigError> {
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(source) => return Err(ConfigError::ReadMapping { path, source }),
    };
    let mapping: RoleMapping = match serde_json::from_str(&raw) {
        Ok(mapping) => mapping,
        Err(source) => return Err(ConfigError::ParseMapping { path, source }),
    };
    tracing::info!(path = %path.display(), entries = mapping.len(), "loaded role mapping");
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = BackfillConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BackfillConfig::default());
    }

    #[test]
    fn workers_must_be_positive() {
        for bad in ["0", "-2", "many", ""] {
            let err = BackfillConfig::from_lookup(lookup(&[(BACKFILL_WORKERS_VAR, bad)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidWorkers(_)), "{bad:?}");
        }
        let config = BackfillConfig::from_lookup(lookup(&[(BACKFILL_WORKERS_VAR, " 4 ")])).unwrap();
        assert_eq!(config.workers.get(), 4);
    }

    #[test]
    fn mapping_is_read_from_file() {
        let path = std::env::temp_dir().join(format!("bizauth-mapping-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"STAFF": "Clerk", "OWNER": "Owner"}"#).unwrap();

        let config =
            BackfillConfig::from_lookup(lookup(&[(ROLE_MAPPING_VAR, path.to_str().unwrap())])).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.mapping, RoleMapping::from_pairs([("STAFF", "Clerk"), ("OWNER", "Owner")]));
    }

    #[test]
    fn missing_mapping_file_is_an_error() {
        let err = BackfillConfig::from_lookup(lookup(&[(ROLE_MAPPING_VAR, "/nonexistent/bizauth.json")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReadMapping { .. }));
    }
}
