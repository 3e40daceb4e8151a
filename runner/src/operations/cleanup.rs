//! Deferred cleanup
//!
//! Each scope (run, test instance) owns a [`CleanupStack`]. Entries run when
//! the scope exits, whatever the outcome, in reverse registration order.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

type CleanupFn = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// LIFO stack of deferred async closures
#[derive(Default)]
pub struct CleanupStack {
    entries: Mutex<Vec<CleanupFn>>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CleanupFn>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `f` to run when the scope exits
    pub fn defer<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.lock().push(Box::new(move || f().boxed()));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drain the stack, most recent entry first
    ///
    /// Entries registered while draining run too.
    pub async fn run(&self) {
        loop {
            let next = self.lock().pop();
            match next {
                Some(cleanup) => cleanup().await,
                None => break,
            }
        }
    }
}

impl std::fmt::Debug for CleanupStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupStack")
            .field("pending", &self.len())
            .finish()
    }
}

/// Whether deletion cleanups should be skipped; the innermost setting wins
pub fn skip(config: bool, test: Option<bool>, step: Option<bool>) -> bool {
    step.or(test).unwrap_or(config)
}
