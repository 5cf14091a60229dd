//! Credential store selection.

use std::{path::Path, sync::Arc};

use kw_core::{CredentialStorePort, StoreBackend, StoreSettings};

use crate::{
    capability::{detect_storage_capability, SecureStorageCapability},
    file_store::FileCredentialStore,
    memory_store::MemoryCredentialStore,
    system_store::SystemCredentialStore,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreFactoryError {
    #[error("credential storage unsupported: {capability:?}")]
    Unsupported { capability: SecureStorageCapability },

    #[error("failed to initialize file-based credential store: {0}")]
    FileBasedInit(#[from] std::io::Error),
}

fn file_store(file_dir: &Path) -> Result<Arc<dyn CredentialStorePort>, StoreFactoryError> {
    let store = if file_dir.as_os_str().is_empty() {
        FileCredentialStore::new()?
    } else {
        FileCredentialStore::in_dir(file_dir.to_path_buf())?
    };
    log::info!("Using file-based credential store at {}", store.base_dir().display());
    Ok(Arc::new(store))
}

fn store_from_capability(
    capability: SecureStorageCapability,
    file_dir: &Path,
) -> Result<Arc<dyn CredentialStorePort>, StoreFactoryError> {
    match capability {
        SecureStorageCapability::SystemKeyring => {
            log::info!("Using system keyring for credential storage");
            Ok(Arc::new(SystemCredentialStore::new()))
        }
        SecureStorageCapability::FileBasedKeystore => {
            log::warn!("Using file-based credential store (insecure dev fallback)");
            file_store(file_dir)
        }
        SecureStorageCapability::Unsupported => {
            log::error!("Credential storage unsupported: {:?}", capability);
            Err(StoreFactoryError::Unsupported { capability })
        }
    }
}

/// Build the store named by `settings`.
///
/// `Auto` consults [`detect_storage_capability`]; an empty `file_dir` means
/// the default config-directory location.
pub fn create_store(
    settings: &StoreSettings,
) -> Result<Arc<dyn CredentialStorePort>, StoreFactoryError> {
    match settings.backend {
        StoreBackend::Auto => {
            let capability = detect_storage_capability();
            log::debug!("Detected credential storage capability: {:?}", capability);
            store_from_capability(capability, &settings.file_dir)
        }
        StoreBackend::System => {
            store_from_capability(SecureStorageCapability::SystemKeyring, &settings.file_dir)
        }
        StoreBackend::File => file_store(&settings.file_dir),
        StoreBackend::Memory => {
            log::info!("Using in-memory credential store");
            Ok(Arc::new(MemoryCredentialStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_core::{Namespace, QueryBuilder, Status};

    #[test]
    fn unsupported_capability_returns_error() {
        let result = store_from_capability(SecureStorageCapability::Unsupported, Path::new(""));
        assert!(matches!(
            result,
            Err(StoreFactoryError::Unsupported { .. })
        ));
    }

    #[test]
    fn system_capability_returns_ok() {
        let result = store_from_capability(SecureStorageCapability::SystemKeyring, Path::new(""));
        assert!(result.is_ok());
    }

    #[test]
    fn file_backend_creates_base_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let base = temp_dir.path().join("nested").join("keystore");
        let settings = StoreSettings {
            backend: StoreBackend::File,
            file_dir: base.clone(),
        };

        let store = create_store(&settings).unwrap();
        assert!(base.is_dir());

        let query = QueryBuilder::new(Namespace::new("Test")).namespace_query();
        assert_eq!(store.delete(&query), Err(Status::ITEM_NOT_FOUND));
    }

    #[test]
    fn memory_backend_starts_empty() {
        let settings = StoreSettings {
            backend: StoreBackend::Memory,
            ..StoreSettings::default()
        };
        let store = create_store(&settings).unwrap();
        let query = QueryBuilder::new(Namespace::new("Test")).fetch_query("InfoKey");
        assert_eq!(store.copy_matching(&query).err(), Some(Status::ITEM_NOT_FOUND));
    }
}
