//! Port interfaces for the application layer
//!
//! Ports define the contract between the keychain client and the platform
//! store implementations, so the client stays independent of any concrete
//! secure storage engine.

pub mod credential_store;

pub use credential_store::{CredentialStorePort, MatchedItem, StoreResult};
