//! # Pure Data Module - Data Transfer Objects Only
//!
//! ## Responsibilities
//!
//! - Define configuration data structures
//! - Provide TOML → DTO mapping
//!
//! ## Prohibited
//!
//! - No business logic or policies
//! - No validation logic
//!
//! > **This module contains data only, no policy, no validation.**

pub mod keychain_config;

pub use keychain_config::{KeychainConfig, MissingEntryPolicy, StoreBackend, StoreSettings};
