//! # Dependency Assembly
//!
//! Turns a loaded [`KeychainConfig`] into a ready [`Keychain`]: picks the
//! store backend, builds the client and attaches a work queue.
//!
//! Assembly only. Config was loaded (without validation) in `config.rs`;
//! operation semantics live in `kw-app`.

use anyhow::Context;
use tracing::info;

use kw_app::{Keychain, KeychainClient, WorkQueue};
use kw_core::KeychainConfig;
use kw_platform::create_store;

/// Build a [`Keychain`] on the process-wide work queue.
pub fn build_keychain(config: &KeychainConfig) -> anyhow::Result<Keychain> {
    let queue = WorkQueue::global().context("Failed to start keychain worker runtime")?;
    build_keychain_on(config, queue)
}

/// Build a [`Keychain`] that runs its work on `queue`.
pub fn build_keychain_on(config: &KeychainConfig, queue: WorkQueue) -> anyhow::Result<Keychain> {
    let store = create_store(&config.store).context("Failed to create credential store")?;
    let client = KeychainClient::from_config(store, config);

    info!(
        namespace = %client.namespace(),
        backend = ?config.store.backend,
        missing_entry = ?config.missing_entry,
        "Keychain ready"
    );
    Ok(Keychain::new(client, queue))
}
