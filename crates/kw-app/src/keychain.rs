//! Entry point bundling one client with every calling style.

use std::sync::Arc;

use crate::adapters::{AsyncKeychain, CallbackKeychain, ObservableKeychain, PublisherKeychain};
use crate::client::KeychainClient;
use crate::queue::WorkQueue;

/// Shared client plus work queue, handing out each calling-style adapter.
///
/// Cloning is cheap; all clones and adapters share the same client.
#[derive(Clone)]
pub struct Keychain {
    client: Arc<KeychainClient>,
    queue: WorkQueue,
}

impl Keychain {
    pub fn new(client: KeychainClient, queue: WorkQueue) -> Self {
        Self {
            client: Arc::new(client),
            queue,
        }
    }

    /// Synchronous access on the caller's thread.
    pub fn client(&self) -> &KeychainClient {
        &self.client
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    pub fn callbacks(&self) -> CallbackKeychain {
        CallbackKeychain::new(Arc::clone(&self.client), self.queue.clone())
    }

    pub fn awaitable(&self) -> AsyncKeychain {
        AsyncKeychain::new(self.callbacks())
    }

    pub fn publisher(&self) -> PublisherKeychain {
        PublisherKeychain::new(self.awaitable())
    }

    pub fn observable(&self) -> ObservableKeychain {
        ObservableKeychain::new(self.callbacks())
    }
}
