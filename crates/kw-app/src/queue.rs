//! Background work queue for the non-blocking calling styles.

use std::io;

use once_cell::sync::OnceCell;
use tokio::runtime::{Builder, Handle, Runtime};

static GLOBAL_RUNTIME: OnceCell<Runtime> = OnceCell::new();

const WORKER_THREAD_NAME: &str = "keychain-worker";

/// Handle to the blocking pool that runs keychain operations.
///
/// Every operation is submitted as one `spawn_blocking` unit and runs to
/// completion there. Work is never cancelled once submitted.
#[derive(Clone, Debug)]
pub struct WorkQueue {
    handle: Handle,
}

impl WorkQueue {
    /// Process-wide queue, backed by a runtime built on first use.
    pub fn global() -> io::Result<Self> {
        let runtime = GLOBAL_RUNTIME.get_or_try_init(|| {
            tracing::debug!("Starting global keychain worker runtime");
            Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name(WORKER_THREAD_NAME)
                .enable_all()
                .build()
        })?;
        Ok(Self::from_handle(runtime.handle().clone()))
    }

    /// Queue on an existing runtime.
    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }

    /// Queue on the runtime the caller is running in, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::from_handle)
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Submit `work` to the blocking pool. The join handle is detached.
    pub fn dispatch<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        drop(self.handle.spawn_blocking(work));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn global_queue_runs_work_off_the_caller_thread() {
        let queue = WorkQueue::global().unwrap();
        let caller = std::thread::current().id();
        let (tx, rx) = mpsc::channel();

        queue.dispatch(move || {
            let _ = tx.send(std::thread::current().id());
        });

        let worker = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_ne!(worker, caller);
    }

    #[test]
    fn global_runtime_is_built_once() {
        WorkQueue::global().unwrap();
        let first = GLOBAL_RUNTIME.get().map(|rt| rt as *const Runtime);
        WorkQueue::global().unwrap();
        let second = GLOBAL_RUNTIME.get().map(|rt| rt as *const Runtime);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn current_reuses_the_callers_runtime() {
        let queue = WorkQueue::current().expect("inside a runtime");
        let (tx, rx) = tokio::sync::oneshot::channel();
        queue.dispatch(move || {
            let _ = tx.send(Handle::try_current().is_ok());
        });
        assert!(rx.await.unwrap());
    }

    #[test]
    fn current_is_none_outside_a_runtime() {
        assert!(WorkQueue::current().is_none());
    }
}
