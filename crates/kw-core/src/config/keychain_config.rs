use std::path::PathBuf;

use crate::namespace::Namespace;

/// What `fetch` reports when the key has no entry.
///
/// Fixed per client and applied identically by every calling style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingEntryPolicy {
    /// Missing entries are a successful `None`.
    #[default]
    Absent,
    /// Missing entries fail with `KeychainError::NotFound`.
    Error,
}

impl MissingEntryPolicy {
    /// Map a config string onto a policy. Anything but `"error"` is `Absent`.
    pub fn from_config_str(value: &str) -> Self {
        if value.eq_ignore_ascii_case("error") {
            Self::Error
        } else {
            Self::Absent
        }
    }
}

/// Which store backend to wire up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Detect from the platform capability.
    #[default]
    Auto,
    System,
    File,
    Memory,
}

impl StoreBackend {
    /// Map a config string onto a backend. Unknown names fall back to `Auto`.
    pub fn from_config_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "system" => Self::System,
            "file" => Self::File,
            "memory" => Self::Memory,
            _ => Self::Auto,
        }
    }
}

/// Store selection settings (pure data, no existence checks).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreSettings {
    pub backend: StoreBackend,

    /// Base directory for the file backend (may be empty).
    pub file_dir: PathBuf,
}

/// Keychain configuration DTO (pure data, no logic)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeychainConfig {
    /// Namespace root key (may be empty - this is a fact, not an error)
    pub root_key: String,

    /// Optional access group shared between applications
    pub access_group: Option<String>,

    pub missing_entry: MissingEntryPolicy,

    pub store: StoreSettings,
}

impl KeychainConfig {
    /// Create KeychainConfig from TOML value
    ///
    /// **Prohibited**: This method must NOT contain any validation logic.
    /// Empty strings are valid "facts"; unknown enum names map to defaults.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let keychain = toml_value.get("keychain");
        let store = toml_value.get("store");

        Ok(Self {
            root_key: keychain
                .and_then(|k| k.get("root_key"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            access_group: keychain
                .and_then(|k| k.get("access_group"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
            missing_entry: keychain
                .and_then(|k| k.get("missing_entry"))
                .and_then(|v| v.as_str())
                .map(MissingEntryPolicy::from_config_str)
                .unwrap_or_default(),
            store: StoreSettings {
                backend: store
                    .and_then(|s| s.get("backend"))
                    .and_then(|v| v.as_str())
                    .map(StoreBackend::from_config_str)
                    .unwrap_or_default(),
                file_dir: PathBuf::from(
                    store
                        .and_then(|s| s.get("file_dir"))
                        .and_then(|v| v.as_str())
                        .unwrap_or(""),
                ),
            },
        })
    }

    /// Create a config for `root_key` with every other field at its default.
    pub fn for_root_key(root_key: impl Into<String>) -> Self {
        Self {
            root_key: root_key.into(),
            access_group: None,
            missing_entry: MissingEntryPolicy::default(),
            store: StoreSettings::default(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        match &self.access_group {
            Some(group) => Namespace::with_access_group(self.root_key.clone(), group.clone()),
            None => Namespace::new(self.root_key.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_toml_reads_all_sections() {
        let value: toml::Value = toml::from_str(
            r#"
            [keychain]
            root_key = "com.example.app"
            access_group = "TEAMID.group.example"
            missing_entry = "error"

            [store]
            backend = "file"
            file_dir = "/tmp/keystore"
            "#,
        )
        .unwrap();

        let config = KeychainConfig::from_toml(&value).unwrap();
        assert_eq!(config.root_key, "com.example.app");
        assert_eq!(config.access_group.as_deref(), Some("TEAMID.group.example"));
        assert_eq!(config.missing_entry, MissingEntryPolicy::Error);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.file_dir, PathBuf::from("/tmp/keystore"));
        assert_eq!(
            config.namespace(),
            Namespace::with_access_group("com.example.app", "TEAMID.group.example")
        );
    }

    #[test]
    fn from_toml_missing_values_are_empty_facts() {
        let value: toml::Value = toml::from_str("[keychain]\n").unwrap();
        let config = KeychainConfig::from_toml(&value).unwrap();
        assert_eq!(config.root_key, "");
        assert!(config.access_group.is_none());
        assert_eq!(config.missing_entry, MissingEntryPolicy::Absent);
        assert_eq!(config.store, StoreSettings::default());
    }

    #[test]
    fn unknown_names_map_to_defaults() {
        assert_eq!(StoreBackend::from_config_str("vault"), StoreBackend::Auto);
        assert_eq!(StoreBackend::from_config_str("MEMORY"), StoreBackend::Memory);
        assert_eq!(
            MissingEntryPolicy::from_config_str("nil"),
            MissingEntryPolicy::Absent
        );
    }
}
