use std::ffi::OsString;

use kw_core::KeychainResult;

use super::{await_completion, completion_channel, CallbackKeychain};

/// async/await style, bridged from [`CallbackKeychain`].
///
/// The operation is submitted when the returned future is first polled.
/// Dropping the future afterwards only stops waiting; the submitted work
/// still runs to completion.
#[derive(Clone)]
pub struct AsyncKeychain {
    callbacks: CallbackKeychain,
}

impl AsyncKeychain {
    pub fn new(callbacks: CallbackKeychain) -> Self {
        Self { callbacks }
    }

    pub async fn upsert(
        &self,
        key: impl Into<OsString>,
        value: impl Into<OsString>,
    ) -> KeychainResult<()> {
        let (completion, rx) = completion_channel();
        self.callbacks.upsert(key, value, completion);
        await_completion(rx).await
    }

    pub async fn fetch(&self, key: impl Into<OsString>) -> KeychainResult<Option<String>> {
        let (completion, rx) = completion_channel();
        self.callbacks.fetch(key, completion);
        await_completion(rx).await
    }

    pub async fn delete(&self, key: impl Into<OsString>) -> KeychainResult<()> {
        let (completion, rx) = completion_channel();
        self.callbacks.delete(key, completion);
        await_completion(rx).await
    }

    pub async fn delete_all(&self) -> KeychainResult<()> {
        let (completion, rx) = completion_channel();
        self.callbacks.delete_all(completion);
        await_completion(rx).await
    }
}
