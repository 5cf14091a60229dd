use std::ffi::OsString;
use std::fmt;
use std::future::IntoFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use kw_core::{KeychainError, KeychainResult};

use super::{await_completion, completion_channel, CallbackKeychain, Completion};

/// Terminal event of a [`Single`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleEvent<T> {
    Success(T),
    Error(KeychainError),
}

impl<T> SingleEvent<T> {
    pub fn into_result(self) -> KeychainResult<T> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Error(err) => Err(err),
        }
    }
}

impl<T> From<KeychainResult<T>> for SingleEvent<T> {
    fn from(result: KeychainResult<T>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Error(err),
        }
    }
}

/// Subscription handle returned by [`Single::subscribe`].
///
/// Disposing detaches the observer; the operation itself keeps running.
#[derive(Clone, Default)]
pub struct Disposable {
    disposed: Arc<AtomicBool>,
}

impl Disposable {
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

type Subscribe<T> = dyn Fn(Completion<T>) + Send + Sync + 'static;

/// Cold single-value observable.
///
/// Nothing runs until [`subscribe`](Single::subscribe); every subscription
/// starts its own operation and receives exactly one [`SingleEvent`], on the
/// worker thread.
pub struct Single<T> {
    subscribe: Arc<Subscribe<T>>,
}

impl<T> Clone for Single<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe: Arc::clone(&self.subscribe),
        }
    }
}

impl<T: Send + 'static> Single<T> {
    pub(crate) fn create<S>(subscribe: S) -> Self
    where
        S: Fn(Completion<T>) + Send + Sync + 'static,
    {
        Self {
            subscribe: Arc::new(subscribe),
        }
    }

    pub fn subscribe<O>(&self, observer: O) -> Disposable
    where
        O: FnOnce(SingleEvent<T>) + Send + 'static,
    {
        let disposable = Disposable::default();
        let disposed = Arc::clone(&disposable.disposed);
        (self.subscribe)(Box::new(move |result| {
            if disposed.load(Ordering::Acquire) {
                tracing::debug!("Observer disposed before completion");
                return;
            }
            observer(SingleEvent::from(result));
        }));
        disposable
    }

    /// Subscribe and block the calling thread until the event arrives.
    ///
    /// Must not be called from the worker thread that would run the operation.
    pub fn wait(&self, timeout: Duration) -> KeychainResult<T> {
        let (tx, rx) = mpsc::channel();
        let subscription = self.subscribe(move |event| {
            let _ = tx.send(event);
        });
        match rx.recv_timeout(timeout) {
            Ok(event) => event.into_result(),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                subscription.dispose();
                Err(KeychainError::Dispatch(format!(
                    "no result within {timeout:?}"
                )))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(KeychainError::Dispatch(
                "background work was dropped without a result".to_string(),
            )),
        }
    }
}

impl<T: Send + 'static> IntoFuture for Single<T> {
    type Output = KeychainResult<T>;
    type IntoFuture = BoxFuture<'static, KeychainResult<T>>;

    fn into_future(self) -> Self::IntoFuture {
        async move {
            let (completion, rx) = completion_channel();
            (self.subscribe)(completion);
            await_completion(rx).await
        }
        .boxed()
    }
}

/// Reactive observable style: every operation returns a cold [`Single`].
#[derive(Clone)]
pub struct ObservableKeychain {
    callbacks: CallbackKeychain,
}

impl ObservableKeychain {
    pub fn new(callbacks: CallbackKeychain) -> Self {
        Self { callbacks }
    }

    pub fn upsert(&self, key: impl Into<OsString>, value: impl Into<OsString>) -> Single<()> {
        let callbacks = self.callbacks.clone();
        let key = key.into();
        let value = value.into();
        Single::create(move |done| callbacks.upsert(key.clone(), value.clone(), done))
    }

    pub fn fetch(&self, key: impl Into<OsString>) -> Single<Option<String>> {
        let callbacks = self.callbacks.clone();
        let key = key.into();
        Single::create(move |done| callbacks.fetch(key.clone(), done))
    }

    pub fn delete(&self, key: impl Into<OsString>) -> Single<()> {
        let callbacks = self.callbacks.clone();
        let key = key.into();
        Single::create(move |done| callbacks.delete(key.clone(), done))
    }

    pub fn delete_all(&self) -> Single<()> {
        let callbacks = self.callbacks.clone();
        Single::create(move |done| callbacks.delete_all(done))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeychainClient, WorkQueue};
    use kw_core::Namespace;
    use kw_platform::{MemoryCredentialStore, StoreOp};
    use std::sync::Mutex;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn observable(store: Arc<MemoryCredentialStore>) -> ObservableKeychain {
        let client = KeychainClient::new(store, Namespace::new("Test"));
        ObservableKeychain::new(CallbackKeychain::new(
            Arc::new(client),
            WorkQueue::global().unwrap(),
        ))
    }

    #[test]
    fn single_is_cold_until_subscribed() {
        let store = Arc::new(MemoryCredentialStore::new());
        let single = observable(Arc::clone(&store)).delete_all();

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.call_count(StoreOp::Delete), 0);

        single.wait(TIMEOUT).unwrap();
        assert_eq!(store.call_count(StoreOp::Delete), 1);
    }

    #[test]
    fn each_subscription_runs_the_operation_once() {
        let store = Arc::new(MemoryCredentialStore::new());
        let single = observable(Arc::clone(&store)).fetch("InfoKey");

        assert_eq!(single.wait(TIMEOUT), Ok(None));
        assert_eq!(single.wait(TIMEOUT), Ok(None));
        assert_eq!(store.call_count(StoreOp::CopyMatching), 2);
    }

    #[test]
    fn subscribe_delivers_one_event() {
        let store = Arc::new(MemoryCredentialStore::new());
        let keychain = observable(store);
        keychain.upsert("InfoKey", "SecretInfo").wait(TIMEOUT).unwrap();

        let (tx, rx) = mpsc::channel();
        keychain.fetch("InfoKey").subscribe(move |event| {
            tx.send(event).unwrap();
        });
        assert_eq!(
            rx.recv_timeout(TIMEOUT).unwrap(),
            SingleEvent::Success(Some("SecretInfo".to_string()))
        );
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn disposed_observer_is_not_called() {
        let pending: Arc<Mutex<Option<Completion<()>>>> = Arc::default();
        let slot = Arc::clone(&pending);
        let single = Single::create(move |done| {
            *slot.lock().unwrap() = Some(done);
        });

        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let subscription = single.subscribe(move |_| flag.store(true, Ordering::SeqCst));
        subscription.dispose();
        assert!(subscription.is_disposed());

        let done = pending.lock().unwrap().take().expect("subscribed");
        done(Ok(()));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn single_can_be_awaited() {
        let store = Arc::new(MemoryCredentialStore::new());
        let keychain = observable(store);

        keychain.upsert("InfoKey", "A").await.unwrap();
        assert_eq!(keychain.fetch("InfoKey").await, Ok(Some("A".to_string())));
    }
}
