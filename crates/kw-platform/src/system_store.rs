//! System keyring-backed credential store.
//!
//! Uses the `keyring` crate (macOS/iOS Keychain, Windows Credential Manager,
//! Linux Secret Service). The keyring API addresses single entries only, so
//! each partition also keeps an account index entry that makes namespace-wide
//! search and delete possible.
//!
//! Caller accounts are stored with the `kw:item:` prefix and the index under
//! `kw:index:v1`, so no caller key can address the index.
//!
//! The access group is folded into the keyring service name
//! (`<group>/<service>`); queries match their exact partition.

use std::sync::{Mutex, PoisonError};

use keyring::Entry;
use kw_core::{Attribute, CredentialStorePort, MatchedItem, Query, Status, StoreResult};

use crate::item::ItemIdentity;

/// Keyring username of the per-partition index entry.
const INDEX_ACCOUNT: &str = "kw:index:v1";

/// Prefix of every keyring username that holds a caller entry.
const ITEM_ACCOUNT_PREFIX: &str = "kw:item:";

trait KeyringEntryOps {
    fn get_secret(&self) -> Result<Vec<u8>, keyring::Error>;
    fn set_secret(&self, secret: &[u8]) -> Result<(), keyring::Error>;
    fn delete_credential(&self) -> Result<(), keyring::Error>;
}

trait KeyringBackend {
    type Entry: KeyringEntryOps;
    fn new_entry(&self, service: &str, username: &str) -> Result<Self::Entry, keyring::Error>;
}

struct RealBackend;

struct RealEntry {
    inner: Entry,
}

impl KeyringEntryOps for RealEntry {
    fn get_secret(&self) -> Result<Vec<u8>, keyring::Error> {
        self.inner.get_secret()
    }

    fn set_secret(&self, secret: &[u8]) -> Result<(), keyring::Error> {
        self.inner.set_secret(secret)
    }

    fn delete_credential(&self) -> Result<(), keyring::Error> {
        self.inner.delete_credential()
    }
}

impl KeyringBackend for RealBackend {
    type Entry = RealEntry;

    fn new_entry(&self, service: &str, username: &str) -> Result<Self::Entry, keyring::Error> {
        Entry::new(service, username).map(|inner| RealEntry { inner })
    }
}

fn map_keyring_error(context: &str, err: keyring::Error) -> Status {
    match err {
        keyring::Error::NoEntry => Status::ITEM_NOT_FOUND,
        keyring::Error::NoStorageAccess(e) => {
            log::warn!("{context}: keyring not accessible: {e}");
            Status::INTERACTION_NOT_ALLOWED
        }
        keyring::Error::PlatformFailure(e) => {
            log::warn!("{context}: platform failure: {e}");
            Status::IO
        }
        keyring::Error::BadEncoding(_) => Status::DECODE,
        keyring::Error::Ambiguous(_) => Status::DUPLICATE_ITEM,
        keyring::Error::TooLong(attr, limit) => {
            log::warn!("{context}: attribute {attr} longer than {limit}");
            Status::PARAM
        }
        keyring::Error::Invalid(attr, reason) => {
            log::warn!("{context}: invalid attribute {attr}: {reason}");
            Status::PARAM
        }
        err => {
            log::warn!("{context}: {err}");
            Status::IO
        }
    }
}

fn item_username(account: &str) -> String {
    format!("{ITEM_ACCOUNT_PREFIX}{account}")
}

fn keyring_service(access_group: Option<&str>, service: &str) -> String {
    match access_group {
        Some(group) => format!("{group}/{service}"),
        None => service.to_string(),
    }
}

/// One keyring partition: a service name plus its account index.
struct Partition<'a, B: KeyringBackend> {
    backend: &'a B,
    access_group: Option<String>,
    service: String,
    keyring_service: String,
}

impl<'a, B: KeyringBackend> Partition<'a, B> {
    fn for_query(backend: &'a B, query: &Query) -> StoreResult<Self> {
        let service = query.service().ok_or(Status::PARAM)?;
        let access_group = query.access_group();
        Ok(Self {
            backend,
            access_group: access_group.map(str::to_string),
            service: service.to_string(),
            keyring_service: keyring_service(access_group, service),
        })
    }

    fn open(&self, username: &str) -> StoreResult<B::Entry> {
        self.backend
            .new_entry(&self.keyring_service, username)
            .map_err(|e| map_keyring_error("failed to access keyring entry", e))
    }

    /// Keyring entry holding the caller entry `account`.
    fn entry(&self, account: &str) -> StoreResult<B::Entry> {
        self.open(&item_username(account))
    }

    fn index(&self) -> StoreResult<B::Entry> {
        self.open(INDEX_ACCOUNT)
    }

    fn identity(&self, account: &str) -> ItemIdentity {
        ItemIdentity {
            access_group: self.access_group.clone(),
            service: self.service.clone(),
            account: account.to_string(),
        }
    }

    fn accounts(&self) -> StoreResult<Vec<String>> {
        match self.index()?.get_secret() {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                log::warn!("keyring account index is corrupt: {e}");
                Status::DECODE
            }),
            Err(keyring::Error::NoEntry) => Ok(Vec::new()),
            Err(e) => Err(map_keyring_error("failed to read account index", e)),
        }
    }

    fn write_accounts(&self, accounts: &[String]) -> StoreResult<()> {
        let index = self.index()?;
        if accounts.is_empty() {
            return match index.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(map_keyring_error("failed to delete account index", e)),
            };
        }
        let bytes = serde_json::to_vec(accounts).map_err(|e| {
            log::warn!("failed to encode account index: {e}");
            Status::PARAM
        })?;
        index
            .set_secret(&bytes)
            .map_err(|e| map_keyring_error("failed to write account index", e))
    }

    /// Accounts addressed by `query`: the named one, or every indexed one.
    fn targets(&self, query: &Query) -> StoreResult<Vec<String>> {
        match query.account() {
            Some(account) => Ok(vec![account.to_string()]),
            None => self.accounts(),
        }
    }
}

fn copy_matching_with_backend<B: KeyringBackend>(
    backend: &B,
    query: &Query,
) -> StoreResult<MatchedItem> {
    let partition = Partition::for_query(backend, query)?;
    for account in partition.targets(query)? {
        match partition.entry(&account)?.get_secret() {
            Ok(data) => return Ok(partition.identity(&account).to_matched(query, &data)),
            Err(keyring::Error::NoEntry) => continue,
            Err(e) => return Err(map_keyring_error("failed to read keyring entry", e)),
        }
    }
    Err(Status::ITEM_NOT_FOUND)
}

fn add_with_backend<B: KeyringBackend>(backend: &B, query: &Query) -> StoreResult<()> {
    let partition = Partition::for_query(backend, query)?;
    let account = query.account().ok_or(Status::PARAM)?;
    let data = query.data(Attribute::ValueData).ok_or(Status::PARAM)?;

    let entry = partition.entry(account)?;
    match entry.get_secret() {
        Ok(_) => return Err(Status::DUPLICATE_ITEM),
        Err(keyring::Error::NoEntry) => {}
        Err(e) => return Err(map_keyring_error("failed to probe keyring entry", e)),
    }
    entry
        .set_secret(data)
        .map_err(|e| map_keyring_error("failed to store keyring entry", e))?;

    let mut accounts = partition.accounts()?;
    if !accounts.iter().any(|existing| existing == account) {
        accounts.push(account.to_string());
        partition.write_accounts(&accounts)?;
    }
    Ok(())
}

fn update_with_backend<B: KeyringBackend>(
    backend: &B,
    query: &Query,
    attributes: &Query,
) -> StoreResult<()> {
    let partition = Partition::for_query(backend, query)?;
    let data = attributes.data(Attribute::ValueData).ok_or(Status::PARAM)?;

    let mut updated = 0;
    for account in partition.targets(query)? {
        let entry = partition.entry(&account)?;
        match entry.get_secret() {
            Ok(_) => {}
            Err(keyring::Error::NoEntry) => continue,
            Err(e) => return Err(map_keyring_error("failed to probe keyring entry", e)),
        }
        entry
            .set_secret(data)
            .map_err(|e| map_keyring_error("failed to update keyring entry", e))?;
        updated += 1;
    }
    if updated == 0 {
        return Err(Status::ITEM_NOT_FOUND);
    }
    Ok(())
}

fn delete_with_backend<B: KeyringBackend>(backend: &B, query: &Query) -> StoreResult<()> {
    let partition = Partition::for_query(backend, query)?;
    let targets = partition.targets(query)?;

    let mut deleted = Vec::new();
    for account in targets {
        match partition.entry(&account)?.delete_credential() {
            Ok(()) => deleted.push(account),
            Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(map_keyring_error("failed to delete keyring entry", e)),
        }
    }

    let accounts = partition.accounts()?;
    let remaining: Vec<String> = match query.account() {
        Some(account) => accounts.into_iter().filter(|a| a != account).collect(),
        None => Vec::new(),
    };
    partition.write_accounts(&remaining)?;

    if deleted.is_empty() {
        return Err(Status::ITEM_NOT_FOUND);
    }
    Ok(())
}

/// System keychain-backed credential store.
pub struct SystemCredentialStore {
    // Serializes index read-modify-write cycles within this process.
    index_lock: Mutex<()>,
}

impl SystemCredentialStore {
    pub fn new() -> Self {
        Self {
            index_lock: Mutex::new(()),
        }
    }

    fn with_index_lock<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.index_lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}

impl Default for SystemCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStorePort for SystemCredentialStore {
    fn copy_matching(&self, query: &Query) -> StoreResult<MatchedItem> {
        copy_matching_with_backend(&RealBackend, query)
    }

    fn add(&self, query: &Query) -> StoreResult<()> {
        self.with_index_lock(|| add_with_backend(&RealBackend, query))
    }

    fn update(&self, query: &Query, attributes: &Query) -> StoreResult<()> {
        self.with_index_lock(|| update_with_backend(&RealBackend, query, attributes))
    }

    fn delete(&self, query: &Query) -> StoreResult<()> {
        self.with_index_lock(|| delete_with_backend(&RealBackend, query))
    }
}
