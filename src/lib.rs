//! # keychain-wrapper
//!
//! Store, read and delete string secrets in the platform keychain through the
//! calling style that suits the caller: completion callbacks, async/await,
//! one-shot streams or cold `Single` observables.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use keychain_wrapper::bootstrap;
//!
//! let config = bootstrap::load_config("keychain.toml".into())?;
//! let keychain = bootstrap::build_keychain(&config)?;
//!
//! keychain.awaitable().upsert("InfoKey", "SecretInfo").await?;
//! let secret = keychain.awaitable().fetch("InfoKey").await?;
//! assert_eq!(secret.as_deref(), Some("SecretInfo"));
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;

pub use kw_app::{
    AsyncKeychain, CallbackKeychain, Completion, Disposable, Keychain, KeychainClient,
    ObservableKeychain, PublisherKeychain, Single, SingleEvent, WorkQueue,
};
pub use kw_core::{
    CredentialStorePort, KeychainConfig, KeychainError, KeychainResult, MissingEntryPolicy,
    Namespace, Status, StoreBackend, StoreSettings,
};
pub use kw_platform::{
    create_store, FileCredentialStore, MemoryCredentialStore, SystemCredentialStore,
};
