use std::ffi::OsString;

use futures::stream::{self, BoxStream, StreamExt};
use kw_core::KeychainResult;

use super::AsyncKeychain;

/// Reactive publisher style.
///
/// Each call returns a lazy stream: nothing is submitted until the stream is
/// first polled, after which it yields exactly one result and ends.
#[derive(Clone)]
pub struct PublisherKeychain {
    inner: AsyncKeychain,
}

impl PublisherKeychain {
    pub fn new(inner: AsyncKeychain) -> Self {
        Self { inner }
    }

    pub fn upsert(
        &self,
        key: impl Into<OsString>,
        value: impl Into<OsString>,
    ) -> BoxStream<'static, KeychainResult<()>> {
        let inner = self.inner.clone();
        let key = key.into();
        let value = value.into();
        stream::once(async move { inner.upsert(key, value).await }).boxed()
    }

    pub fn fetch(&self, key: impl Into<OsString>) -> BoxStream<'static, KeychainResult<Option<String>>> {
        let inner = self.inner.clone();
        let key = key.into();
        stream::once(async move { inner.fetch(key).await }).boxed()
    }

    pub fn delete(&self, key: impl Into<OsString>) -> BoxStream<'static, KeychainResult<()>> {
        let inner = self.inner.clone();
        let key = key.into();
        stream::once(async move { inner.delete(key).await }).boxed()
    }

    pub fn delete_all(&self) -> BoxStream<'static, KeychainResult<()>> {
        let inner = self.inner.clone();
        stream::once(async move { inner.delete_all().await }).boxed()
    }
}
