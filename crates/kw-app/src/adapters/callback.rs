use std::ffi::OsString;
use std::sync::Arc;

use kw_core::KeychainResult;

use crate::client::KeychainClient;
use crate::queue::WorkQueue;

/// Completion-handler style.
///
/// Each call submits one unit of work to the [`WorkQueue`] and returns
/// immediately; the completion runs exactly once, on the worker thread.
#[derive(Clone)]
pub struct CallbackKeychain {
    client: Arc<KeychainClient>,
    queue: WorkQueue,
}

impl CallbackKeychain {
    pub fn new(client: Arc<KeychainClient>, queue: WorkQueue) -> Self {
        Self { client, queue }
    }

    pub fn upsert<F>(&self, key: impl Into<OsString>, value: impl Into<OsString>, completion: F)
    where
        F: FnOnce(KeychainResult<()>) + Send + 'static,
    {
        let key = key.into();
        let value = value.into();
        self.run(move |client| client.upsert(&key, &value), completion);
    }

    pub fn fetch<F>(&self, key: impl Into<OsString>, completion: F)
    where
        F: FnOnce(KeychainResult<Option<String>>) + Send + 'static,
    {
        let key = key.into();
        self.run(move |client| client.fetch(&key), completion);
    }

    pub fn delete<F>(&self, key: impl Into<OsString>, completion: F)
    where
        F: FnOnce(KeychainResult<()>) + Send + 'static,
    {
        let key = key.into();
        self.run(move |client| client.delete(&key), completion);
    }

    pub fn delete_all<F>(&self, completion: F)
    where
        F: FnOnce(KeychainResult<()>) + Send + 'static,
    {
        self.run(KeychainClient::delete_all, completion);
    }

    fn run<T, W, F>(&self, work: W, completion: F)
    where
        T: Send + 'static,
        W: FnOnce(&KeychainClient) -> KeychainResult<T> + Send + 'static,
        F: FnOnce(KeychainResult<T>) + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        self.queue.dispatch(move || completion(work(&*client)));
    }
}
