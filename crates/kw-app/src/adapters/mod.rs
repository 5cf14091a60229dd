//! Calling-style adapters over [`KeychainClient`](crate::KeychainClient).
//!
//! All four styles expose the same operations with the same outcomes:
//!
//! | style | adapter | result channel |
//! |---|---|---|
//! | callback | [`CallbackKeychain`] | `FnOnce(KeychainResult<T>)` on the worker |
//! | async/await | [`AsyncKeychain`] | `async fn` returning `KeychainResult<T>` |
//! | publisher | [`PublisherKeychain`] | one-item `BoxStream` |
//! | observable | [`ObservableKeychain`] | cold [`Single`] |
//!
//! The async and publisher styles are layered on the callback style; the
//! observable style wraps callbacks into a [`Single`].

pub mod callback;
pub mod concurrency;
pub mod observable;
pub mod publisher;

pub use callback::CallbackKeychain;
pub use concurrency::AsyncKeychain;
pub use observable::{Disposable, ObservableKeychain, Single, SingleEvent};
pub use publisher::PublisherKeychain;

use kw_core::{KeychainError, KeychainResult};
use tokio::sync::oneshot;

/// Completion handler accepted by the callback style.
pub type Completion<T> = Box<dyn FnOnce(KeychainResult<T>) + Send + 'static>;

/// Completion that forwards the result into a oneshot channel.
pub(crate) fn completion_channel<T: Send + 'static>(
) -> (Completion<T>, oneshot::Receiver<KeychainResult<T>>) {
    let (tx, rx) = oneshot::channel();
    let completion: Completion<T> = Box::new(move |result| {
        // The receiver may be gone if the caller stopped waiting.
        let _ = tx.send(result);
    });
    (completion, rx)
}

/// Wait for a completion sent through [`completion_channel`].
pub(crate) async fn await_completion<T>(
    rx: oneshot::Receiver<KeychainResult<T>>,
) -> KeychainResult<T> {
    rx.await.unwrap_or_else(|_| {
        tracing::error!("Keychain operation dropped before completing");
        Err(KeychainError::Dispatch(
            "background work was dropped without a result".to_string(),
        ))
    })
}
