//! File-based credential store for WSL and headless environments.
//!
//! Each entry is one file, laid out as
//! `<base>/<group-dir>/s-<hex(service)>/a-<hex(account)>.bin` where the group
//! directory is `g-<hex(access_group)>` or `default`. Names are hex encoded so
//! arbitrary keys cannot escape the base directory.
//!
//! # Security
//!
//! - Files are created with mode 0600 (owner read/write only) on Unix
//! - Every write goes to a fresh temp file that is renamed into place
//! - Store calls are serialized per store instance
//! - Only suitable for development environments

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use kw_core::{Attribute, CredentialStorePort, MatchedItem, Query, Status, StoreResult};

use tempfile::NamedTempFile;

use crate::item::ItemIdentity;

const DEFAULT_GROUP_DIR: &str = "default";
const GROUP_PREFIX: &str = "g-";
const SERVICE_PREFIX: &str = "s-";
const ACCOUNT_PREFIX: &str = "a-";
const ITEM_EXTENSION: &str = "bin";

pub struct FileCredentialStore {
    base_dir: PathBuf,
    // Makes each port call one indivisible step within this process.
    lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Create a store with the default base directory
    /// `<config_dir>/keychain-wrapper/keystore`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config directory cannot be determined
    /// - The base directory cannot be created
    pub fn new() -> Result<Self, io::Error> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Cannot determine config directory")
            })?
            .join("keychain-wrapper")
            .join("keystore");

        fs::create_dir_all(&base_dir)?;
        Ok(Self::with_base_dir(base_dir))
    }

    /// Create a store rooted at `base_dir`, creating it if needed.
    pub fn in_dir(base_dir: PathBuf) -> Result<Self, io::Error> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self::with_base_dir(base_dir))
    }

    /// Construct with a concrete base directory, without touching the disk.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            lock: Mutex::new(()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    fn item_path(&self, identity: &ItemIdentity) -> PathBuf {
        let group_dir = match &identity.access_group {
            Some(group) => format!("{GROUP_PREFIX}{}", hex::encode(group)),
            None => DEFAULT_GROUP_DIR.to_string(),
        };
        self.base_dir
            .join(group_dir)
            .join(format!("{SERVICE_PREFIX}{}", hex::encode(&identity.service)))
            .join(format!(
                "{ACCOUNT_PREFIX}{}.{ITEM_EXTENSION}",
                hex::encode(&identity.account)
            ))
    }

    /// Every stored item whose identity matches `query`, in path order.
    fn matching_items(&self, query: &Query) -> io::Result<Vec<(ItemIdentity, PathBuf)>> {
        let mut found = Vec::new();
        for (group_path, access_group) in list_dirs(&self.base_dir, decode_group)? {
            for (service_path, service) in list_dirs(&group_path, |name| decode_name(name, SERVICE_PREFIX))? {
                for (item_path, account) in list_items(&service_path)? {
                    let identity = ItemIdentity {
                        access_group: access_group.clone(),
                        service: service.clone(),
                        account,
                    };
                    if identity.matches(query) {
                        found.push((identity, item_path));
                    }
                }
            }
        }
        found.sort();
        Ok(found)
    }

    fn map_io_error(context: &str, err: io::Error) -> Status {
        log::warn!("file credential store: {context}: {err}");
        match err.kind() {
            io::ErrorKind::PermissionDenied => Status::AUTH_FAILED,
            _ => Status::IO,
        }
    }
}

impl CredentialStorePort for FileCredentialStore {
    fn copy_matching(&self, query: &Query) -> StoreResult<MatchedItem> {
        self.with_lock(|| self.copy_matching_locked(query))
    }

    fn add(&self, query: &Query) -> StoreResult<()> {
        self.with_lock(|| self.add_locked(query))
    }

    fn update(&self, query: &Query, attributes: &Query) -> StoreResult<()> {
        self.with_lock(|| self.update_locked(query, attributes))
    }

    fn delete(&self, query: &Query) -> StoreResult<()> {
        self.with_lock(|| self.delete_locked(query))
    }
}

impl FileCredentialStore {
    fn copy_matching_locked(&self, query: &Query) -> StoreResult<MatchedItem> {
        let items = self
            .matching_items(query)
            .map_err(|err| Self::map_io_error("failed to scan keystore", err))?;
        let (identity, path) = items.into_iter().next().ok_or(Status::ITEM_NOT_FOUND)?;

        match fs::read(&path) {
            Ok(bytes) => Ok(identity.to_matched(query, &bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Status::ITEM_NOT_FOUND),
            Err(err) => Err(Self::map_io_error("failed to read keystore file", err)),
        }
    }

    fn add_locked(&self, query: &Query) -> StoreResult<()> {
        let identity = ItemIdentity::from_add_query(query)?;
        let data = query.data(Attribute::ValueData).ok_or(Status::PARAM)?;
        let path = self.item_path(&identity);
        if path.exists() {
            return Err(Status::DUPLICATE_ITEM);
        }
        write_atomic(&path, data)
    }

    fn update_locked(&self, query: &Query, attributes: &Query) -> StoreResult<()> {
        let data = attributes.data(Attribute::ValueData).ok_or(Status::PARAM)?;
        let items = self
            .matching_items(query)
            .map_err(|err| Self::map_io_error("failed to scan keystore", err))?;
        if items.is_empty() {
            return Err(Status::ITEM_NOT_FOUND);
        }
        for (_, path) in items {
            write_atomic(&path, data)?;
        }
        Ok(())
    }

    fn delete_locked(&self, query: &Query) -> StoreResult<()> {
        let items = self
            .matching_items(query)
            .map_err(|err| Self::map_io_error("failed to scan keystore", err))?;
        if items.is_empty() {
            return Err(Status::ITEM_NOT_FOUND);
        }
        for (_, path) in items {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(Self::map_io_error("failed to delete keystore file", err)),
            }
            // Drop the service directory once it is empty; failure is harmless.
            if let Some(parent) = path.parent() {
                let _ = fs::remove_dir(parent);
            }
        }
        Ok(())
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let map = FileCredentialStore::map_io_error;
    let parent = path.parent().ok_or(Status::PARAM)?;
    fs::create_dir_all(parent).map_err(|err| map("failed to create keystore directory", err))?;

    let mut temp = create_temp_file(parent)
        .map_err(|err| map("failed to create keystore temp file", err))?;
    temp.write_all(data)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|err| map("failed to write keystore temp file", err))?;
    temp.persist(path)
        .map_err(|err| map("failed to rename keystore file", err.error))?;
    Ok(())
}

/// Uniquely named temp file in `dir`, owner-only from the moment it exists.
fn create_temp_file(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".a-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o600));
    }
    builder.tempfile_in(dir)
}

/// Subdirectories of `dir` whose names decode, with the decoded value.
fn list_dirs<T>(dir: &Path, decode: impl Fn(&str) -> Option<T>) -> io::Result<Vec<(PathBuf, T)>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(value) = entry.file_name().to_str().and_then(&decode) {
            dirs.push((entry.path(), value));
        }
    }
    Ok(dirs)
}

/// Item files of a service directory with their decoded account names.
fn list_items(dir: &Path) -> io::Result<Vec<(PathBuf, String)>> {
    let mut items = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(ITEM_EXTENSION) {
            continue;
        }
        let account = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| decode_name(stem, ACCOUNT_PREFIX));
        if let Some(account) = account {
            items.push((path, account));
        }
    }
    Ok(items)
}

fn decode_group(name: &str) -> Option<Option<String>> {
    if name == DEFAULT_GROUP_DIR {
        return Some(None);
    }
    decode_name(name, GROUP_PREFIX).map(Some)
}

fn decode_name(name: &str, prefix: &str) -> Option<String> {
    let encoded = name.strip_prefix(prefix)?;
    let bytes = hex::decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_core::{Namespace, QueryBuilder};

    fn store() -> (tempfile::TempDir, FileCredentialStore) {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let store = FileCredentialStore::with_base_dir(temp_dir.path().to_path_buf());
        (temp_dir, store)
    }

    fn add(store: &FileCredentialStore, b: &QueryBuilder, key: &str, value: &[u8]) -> StoreResult<()> {
        store.add(&b.account_query(key).merged(&QueryBuilder::value_data(value)))
    }

    #[test]
    fn roundtrip_stores_and_loads() {
        let (_dir, store) = store();
        let b = QueryBuilder::new(Namespace::new("Test"));
        add(&store, &b, "InfoKey", b"SecretInfo").expect("add");

        let item = store.copy_matching(&b.fetch_query("InfoKey")).expect("copy");
        assert_eq!(item.data.as_deref(), Some(&b"SecretInfo"[..]));
    }

    #[test]
    fn missing_key_returns_not_found() {
        let (_dir, store) = store();
        let b = QueryBuilder::new(Namespace::new("Test"));
        assert_eq!(
            store.copy_matching(&b.fetch_query("nope")),
            Err(Status::ITEM_NOT_FOUND)
        );
    }

    #[test]
    fn duplicate_add_and_update() {
        let (_dir, store) = store();
        let b = QueryBuilder::new(Namespace::new("Test"));
        add(&store, &b, "InfoKey", b"A").unwrap();
        assert_eq!(add(&store, &b, "InfoKey", b"B"), Err(Status::DUPLICATE_ITEM));

        store
            .update(&b.account_query("InfoKey"), &QueryBuilder::value_data(b"B"))
            .unwrap();
        let item = store.copy_matching(&b.fetch_query("InfoKey")).unwrap();
        assert_eq!(item.data.as_deref(), Some(&b"B"[..]));
    }

    #[test]
    fn namespace_delete_scoped_by_service_and_group() {
        let (_dir, store) = store();
        let plain = QueryBuilder::new(Namespace::new("Test"));
        let grouped = QueryBuilder::new(Namespace::with_access_group("Test", "group.demo"))
            .with_access_group_scoping(true);
        let other = QueryBuilder::new(Namespace::new("Other"));
        add(&store, &plain, "a", b"1").unwrap();
        add(&store, &grouped, "a", b"2").unwrap();
        add(&store, &other, "a", b"3").unwrap();

        store.delete(&grouped.namespace_query()).unwrap();
        assert_eq!(
            store.copy_matching(&grouped.account_query("a")),
            Err(Status::ITEM_NOT_FOUND)
        );
        assert!(store.copy_matching(&other.account_query("a")).is_ok());

        assert!(store.copy_matching(&plain.account_query("a")).is_ok());

        // Without a group the query stays in the ungrouped partition.
        add(&store, &grouped, "a", b"2").unwrap();
        store.delete(&plain.namespace_query()).unwrap();
        assert_eq!(
            store.delete(&plain.namespace_query()),
            Err(Status::ITEM_NOT_FOUND)
        );
        assert!(store.copy_matching(&grouped.account_query("a")).is_ok());
        assert!(store.copy_matching(&other.account_query("a")).is_ok());
    }

    #[test]
    fn keys_cannot_escape_base_dir() {
        let (dir, store) = store();
        let b = QueryBuilder::new(Namespace::new("../../etc"));
        add(&store, &b, "../passwd", b"x").unwrap();

        let item = store.copy_matching(&b.fetch_query("../passwd")).unwrap();
        assert_eq!(item.data.as_deref(), Some(&b"x"[..]));
        assert!(dir.path().join(DEFAULT_GROUP_DIR).is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store();
        let b = QueryBuilder::new(Namespace::new("Test"));
        add(&store, &b, "InfoKey", b"x").unwrap();

        let path = store.item_path(&ItemIdentity {
            access_group: None,
            service: "Test".into(),
            account: "InfoKey".into(),
        });
        let mode = fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn temp_files_are_owner_only_before_any_write() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let temp = create_temp_file(dir.path()).unwrap();
        let mode = temp.as_file().metadata().unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn writes_leave_no_temp_files_behind() {
        let (_dir, store) = store();
        let b = QueryBuilder::new(Namespace::new("Test"));
        add(&store, &b, "InfoKey", b"A").unwrap();
        store
            .update(&b.account_query("InfoKey"), &QueryBuilder::value_data(b"B"))
            .unwrap();

        let path = store.item_path(&ItemIdentity {
            access_group: None,
            service: "Test".into(),
            account: "InfoKey".into(),
        });
        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1, "{names:?}");
    }

    #[test]
    fn concurrent_updates_of_one_key_never_tear() {
        let (_dir, store) = store();
        let store = std::sync::Arc::new(store);
        let b = QueryBuilder::new(Namespace::new("Test"));
        add(&store, &b, "InfoKey", b"seed").unwrap();

        let payloads: Vec<Vec<u8>> = vec![vec![b'a'; 1 << 20], vec![b'b'; 1 << 20]];
        let workers: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|payload| {
                let store = std::sync::Arc::clone(&store);
                let b = b.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store
                            .update(&b.account_query("InfoKey"), &QueryBuilder::value_data(&payload))
                            .expect("update");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let item = store.copy_matching(&b.fetch_query("InfoKey")).unwrap();
        let data = item.data.unwrap();
        assert!(payloads.contains(&data), "torn value of {} bytes", data.len());
    }

    #[test]
    fn concurrent_adds_of_one_key_admit_exactly_one() {
        let (_dir, store) = store();
        let store = std::sync::Arc::new(store);

        let workers: Vec<_> = (0..4u8)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    let b = QueryBuilder::new(Namespace::new("Test"));
                    add(&store, &b, "InfoKey", &[i])
                })
            })
            .collect();
        let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "{results:?}");
        assert!(results
            .iter()
            .all(|r| matches!(r, Ok(()) | Err(Status::DUPLICATE_ITEM))));
    }
}
