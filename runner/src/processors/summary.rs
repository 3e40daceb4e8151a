use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Outcome counters shared by every test instance of a run
#[derive(Debug, Default)]
pub struct Summary {
    passed: AtomicU32,
    failed: AtomicU32,
    skipped: AtomicU32,
}

/// Point-in-time copy of a [`Summary`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl Summary {
    pub fn inc_passed(&self) {
        self.passed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn passed(&self) -> u32 {
        self.passed.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u32 {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn skipped(&self) -> u32 {
        self.skipped.load(Ordering::SeqCst)
    }

    pub fn counts(&self) -> SummaryCounts {
        SummaryCounts {
            passed: self.passed(),
            failed: self.failed(),
            skipped: self.skipped(),
        }
    }
}

/// Run-wide fail-fast flag
///
/// Advisory: instances check it right before starting. Running instances
/// are never interrupted.
#[derive(Debug, Default)]
pub struct FailFast(AtomicBool);

impl FailFast {
    pub fn mark(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_tripped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
