//! # kw-app
//!
//! Application layer of keychain-wrapper.
//!
//! [`KeychainClient`] runs the four keychain operations (upsert, fetch,
//! delete, delete all) against a [`CredentialStorePort`](kw_core::CredentialStorePort).
//! The [`adapters`] expose it through callback, async/await, publisher and
//! observable styles, all running on a [`WorkQueue`].

pub mod adapters;
pub mod client;
pub mod keychain;
pub mod queue;

pub use adapters::{
    AsyncKeychain, CallbackKeychain, Completion, Disposable, ObservableKeychain,
    PublisherKeychain, Single, SingleEvent,
};
pub use client::KeychainClient;
pub use keychain::Keychain;
pub use queue::WorkQueue;
