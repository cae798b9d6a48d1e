//! Trailing-edge debounce over a tokio timer.

use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use futures::{future::BoxFuture, FutureExt};
use tokio::task::JoinHandle;

type Action<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

/// Runs `action` with the latest value once `window` has passed without a new call.
///
/// Each call cancels the pending timer and starts a fresh one. Only the timer is
/// cancelled: once the action has started it runs to completion on its own task.
pub struct Debouncer<T> {
    window: Duration,
    action: Action<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(window: Duration, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            window,
            action: Arc::new(move |value| action(value).boxed()),
            pending: Mutex::new(None),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn call(&self, value: T) {
        let action = Arc::clone(&self.action);
        let window = self.window;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            tokio::spawn(action(value));
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(timer);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    pub fn cancel(&self) {
        if let Some(pending) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pending.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pending.abort();
        }
    }
}
