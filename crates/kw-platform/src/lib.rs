//! # kw-platform
//!
//! Platform-specific implementations of the credential store port.
//!
//! This crate contains the store backends that talk to the operating system
//! keyring or stand in for it, plus the capability detection used to pick one.

pub mod capability;
pub mod file_store;
mod item;
pub mod memory_store;
pub mod store_factory;
pub mod system_store;

pub use capability::{detect_storage_capability, SecureStorageCapability};
pub use file_store::FileCredentialStore;
pub use memory_store::{MemoryCredentialStore, StoreOp};
pub use store_factory::{create_store, StoreFactoryError};
pub use system_store::SystemCredentialStore;
