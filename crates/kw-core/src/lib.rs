//! # kw-core
//!
//! Core domain models and ports for keychain-wrapper.
//!
//! This crate contains the namespace model, the query builder, the platform
//! status codes and error taxonomy, and the credential store port that every
//! platform backend implements. It has no knowledge of any concrete store.

pub mod config;
pub mod error;
pub mod namespace;
pub mod ports;
pub mod query;
pub mod status;

// Re-export commonly used types at the crate root
pub use config::{KeychainConfig, MissingEntryPolicy, StoreBackend, StoreSettings};
pub use error::{KeychainError, KeychainResult};
pub use namespace::Namespace;
pub use ports::{CredentialStorePort, MatchedItem, StoreResult};
pub use query::{Attribute, AttributeValue, ItemClass, MatchLimit, Query, QueryBuilder, QueryKind};
pub use status::Status;
