use crate::operations::CleanupStack;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome flags of one test instance
#[derive(Debug, Default)]
pub struct TestStatus {
    failed: AtomicBool,
    skipped: AtomicBool,
}

impl TestStatus {
    pub fn fail(&self) {
        self.failed.store(true, Ordering::SeqCst);
    }

    pub fn skip(&self) {
        self.skipped.store(true, Ordering::SeqCst);
    }

    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.load(Ordering::SeqCst)
    }
}

/// Scope of one test instance: its outcome and its cleanups
///
/// Processors report failures through the scope and defer teardown onto it.
/// The scheduler drains the cleanups once the processor returns.
#[derive(Debug)]
pub struct TestScope {
    name: String,
    status: Arc<TestStatus>,
    cleanups: Arc<CleanupStack>,
}

impl TestScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Arc::new(TestStatus::default()),
            cleanups: Arc::new(CleanupStack::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> &Arc<TestStatus> {
        &self.status
    }

    pub fn cleanups(&self) -> &Arc<CleanupStack> {
        &self.cleanups
    }

    pub fn fail(&self) {
        self.status.fail();
    }

    pub fn skip(&self) {
        self.status.skip();
    }

    pub fn is_failed(&self) -> bool {
        self.status.is_failed()
    }

    pub fn is_skipped(&self) -> bool {
        self.status.is_skipped()
    }

    pub fn defer<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cleanups.defer(f);
    }

    /// Run every deferred cleanup, most recent first
    pub async fn finish(&self) {
        self.cleanups.run().await;
    }
}
