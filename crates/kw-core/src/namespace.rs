//! Namespace model.

use std::fmt;

/// Logical partition of stored secrets.
///
/// Identified by a root key (the keychain service) and an optional access
/// group. Two namespaces with the same root key but different access groups
/// address disjoint partitions wherever access groups are enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    root_key: String,
    access_group: Option<String>,
}

impl Namespace {
    pub fn new(root_key: impl Into<String>) -> Self {
        Self {
            root_key: root_key.into(),
            access_group: None,
        }
    }

    /// Create a namespace shared by every application of an access group.
    pub fn with_access_group(root_key: impl Into<String>, access_group: impl Into<String>) -> Self {
        Self {
            root_key: root_key.into(),
            access_group: Some(access_group.into()),
        }
    }

    pub fn root_key(&self) -> &str {
        &self.root_key
    }

    pub fn access_group(&self) -> Option<&str> {
        self.access_group.as_deref()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.access_group {
            Some(group) => write!(f, "{}@{}", self.root_key, group),
            None => f.write_str(&self.root_key),
        }
    }
}
