//! Synchronous credential store client.

use std::ffi::OsStr;
use std::sync::Arc;

use kw_core::{
    CredentialStorePort, KeychainConfig, KeychainError, KeychainResult, MissingEntryPolicy,
    Namespace, QueryBuilder, Status,
};
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Executes the four keychain operations against a [`CredentialStorePort`].
///
/// Every call runs to completion on the caller's thread. The client holds no
/// mutable state and can be shared through an `Arc` without locking; the
/// calling-style adapters all funnel into it.
pub struct KeychainClient {
    store: Arc<dyn CredentialStorePort>,
    queries: QueryBuilder,
    missing_entry: MissingEntryPolicy,
}

impl KeychainClient {
    pub fn new(store: Arc<dyn CredentialStorePort>, namespace: Namespace) -> Self {
        Self {
            store,
            queries: QueryBuilder::new(namespace),
            missing_entry: MissingEntryPolicy::default(),
        }
    }

    /// Client for the namespace and missing-entry policy named by `config`.
    pub fn from_config(store: Arc<dyn CredentialStorePort>, config: &KeychainConfig) -> Self {
        Self::new(store, config.namespace()).with_missing_entry_policy(config.missing_entry)
    }

    pub fn with_missing_entry_policy(mut self, policy: MissingEntryPolicy) -> Self {
        self.missing_entry = policy;
        self
    }

    /// Replace the query builder, e.g. to force access-group scoping on or off.
    pub fn with_query_builder(mut self, queries: QueryBuilder) -> Self {
        self.queries = queries;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        self.queries.namespace()
    }

    pub fn missing_entry_policy(&self) -> MissingEntryPolicy {
        self.missing_entry
    }

    /// Store `value` under `key`, replacing any existing entry.
    ///
    /// Probes for the entry first, then updates or adds. The two store calls
    /// are not atomic: a concurrent writer between them surfaces as a
    /// `DUPLICATE_ITEM` or `ITEM_NOT_FOUND` store error.
    #[tracing::instrument(
        name = "keychain.upsert",
        skip(self, key, value),
        fields(root_key = %self.namespace().root_key(), key = %key.as_ref().to_string_lossy())
    )]
    pub fn upsert(&self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> KeychainResult<()> {
        let account = account(key.as_ref())?;
        let data = encode(value.as_ref())?;

        let query = self.queries.account_query(account);
        match self.store.copy_matching(&query) {
            Ok(_) => {
                self.store
                    .update(&query, &QueryBuilder::value_data(&data))
                    .map_err(|status| self.store_error("update", status))?;
                debug!("Updated existing entry");
            }
            Err(status) if status.is_not_found() => {
                self.store
                    .add(&query.merged(&QueryBuilder::value_data(&data)))
                    .map_err(|status| self.store_error("add", status))?;
                debug!("Added new entry");
            }
            Err(status) => return Err(self.store_error("probe", status)),
        }
        Ok(())
    }

    /// Read the secret stored under `key`.
    ///
    /// A missing entry yields `Ok(None)` or `Err(NotFound)` depending on the
    /// client's [`MissingEntryPolicy`].
    #[tracing::instrument(
        name = "keychain.fetch",
        skip(self, key),
        fields(root_key = %self.namespace().root_key(), key = %key.as_ref().to_string_lossy())
    )]
    pub fn fetch(&self, key: impl AsRef<OsStr>) -> KeychainResult<Option<String>> {
        let account = account(key.as_ref())?;

        match self.store.copy_matching(&self.queries.fetch_query(account)) {
            Ok(item) => {
                let data = item.data.ok_or_else(|| {
                    warn!("Store returned no data for matched entry");
                    KeychainError::Decoding
                })?;
                let value = decode(data)?;
                debug!("Fetched entry");
                Ok(Some(value))
            }
            Err(status) if status.is_not_found() => {
                debug!(policy = ?self.missing_entry, "Entry not found");
                match self.missing_entry {
                    MissingEntryPolicy::Absent => Ok(None),
                    MissingEntryPolicy::Error => Err(KeychainError::NotFound),
                }
            }
            Err(status) => Err(self.store_error("copy_matching", status)),
        }
    }

    /// Delete the entry under `key`. Deleting a missing entry succeeds.
    #[tracing::instrument(
        name = "keychain.delete",
        skip(self, key),
        fields(root_key = %self.namespace().root_key(), key = %key.as_ref().to_string_lossy())
    )]
    pub fn delete(&self, key: impl AsRef<OsStr>) -> KeychainResult<()> {
        let account = account(key.as_ref())?;
        self.delete_matching(&self.queries.account_query(account))
    }

    /// Delete every entry of the namespace in one store call.
    #[tracing::instrument(
        name = "keychain.delete_all",
        skip(self),
        fields(root_key = %self.namespace().root_key())
    )]
    pub fn delete_all(&self) -> KeychainResult<()> {
        self.delete_matching(&self.queries.namespace_query())
    }

    fn delete_matching(&self, query: &kw_core::Query) -> KeychainResult<()> {
        match self.store.delete(query) {
            Ok(()) => {
                debug!("Deleted");
                Ok(())
            }
            Err(status) if status.is_not_found() => {
                debug!("Nothing to delete");
                Ok(())
            }
            Err(status) => Err(self.store_error("delete", status)),
        }
    }

    fn store_error(&self, call: &str, status: Status) -> KeychainError {
        warn!(call, status = status.code(), "Store call failed");
        KeychainError::store(status, self.store.error_message(status))
    }
}

/// Keys become the account attribute, which must be UTF-8.
fn account(key: &OsStr) -> KeychainResult<&str> {
    key.to_str().ok_or(KeychainError::Encoding)
}

fn encode(value: &OsStr) -> KeychainResult<Zeroizing<Vec<u8>>> {
    value
        .to_str()
        .map(|value| Zeroizing::new(value.as_bytes().to_vec()))
        .ok_or(KeychainError::Encoding)
}

fn decode(data: Vec<u8>) -> KeychainResult<String> {
    String::from_utf8(data).map_err(|err| {
        drop(Zeroizing::new(err.into_bytes()));
        warn!("Stored data is not valid UTF-8");
        KeychainError::Decoding
    })
}
