//! Configuration types.

use std::path::PathBuf;

use crate::approval::Role;
use crate::error::ConfigError;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Where the JSON-file key-value store lives.
    pub store_path: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Role granted to a pending request on approval.
    pub approved_role: Role,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./data/ims-store.json"),
            log_filter: "info".to_string(),
            approved_role: Role::Manager,
        }
    }
}

impl AppConfig {
    /// Build from `IMS_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let store_path = lookup("IMS_STORE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);

        let log_filter = lookup("IMS_LOG")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        let approved_role = match lookup("IMS_APPROVED_ROLE") {
            Some(raw) if !raw.trim().is_empty() => {
                raw.trim()
                    .parse::<Role>()
                    .map_err(|message| ConfigError::InvalidValue {
                        key: "IMS_APPROVED_ROLE".to_string(),
                        message,
                    })?
            }
            _ => defaults.approved_role,
        };

        Ok(Self {
            store_path,
            log_filter,
            approved_role,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.store_path, PathBuf::from("./data/ims-store.json"));
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.approved_role, Role::Manager);
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("IMS_STORE_PATH", "/tmp/store.json"),
            ("IMS_LOG", "ims_core=debug"),
            ("IMS_APPROVED_ROLE", "Clerk"),
        ]))
        .unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/store.json"));
        assert_eq!(config.log_filter, "ims_core=debug");
        assert_eq!(config.approved_role, Role::Clerk);
    }

    #[test]
    fn blank_values_fall_back() {
        let config =
            AppConfig::from_lookup(lookup(&[("IMS_STORE_PATH", "  "), ("IMS_LOG", "")])).unwrap();
        assert_eq!(config.store_path, PathBuf::from("./data/ims-store.json"));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn rejects_unknown_role() {
        let err = AppConfig::from_lookup(lookup(&[("IMS_APPROVED_ROLE", "owner")])).unwrap_err();
        assert!(err.to_string().contains("IMS_APPROVED_ROLE"));
    }
}
