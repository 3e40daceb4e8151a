//! Run report
//!
//! Purely additive: the engine records into it, nothing reads it back
//! except `save`.

use crate::error::RunnerError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One executed operation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationReport {
    pub name: String,
    #[serde(rename = "type")]
    pub operation_type: String,
    pub cleanup: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report of one test instance
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub name: String,
    pub id: usize,
    pub scenario_id: usize,
    pub base_path: PathBuf,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub failed: bool,
    pub skipped: bool,
    pub operations: Vec<OperationReport>,
}

/// Shared handle to a test report, cheap to clone into operations
#[derive(Debug, Clone, Default)]
pub struct TestReportHandle(Arc<Mutex<TestReport>>);

impl TestReportHandle {
    fn lock(&self) -> MutexGuard<'_, TestReport> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_start_time(&self, time: DateTime<Utc>) {
        self.lock().start_time = Some(time);
    }

    pub fn set_end_time(&self, time: DateTime<Utc>) {
        self.lock().end_time = Some(time);
    }

    pub fn set_outcome(&self, failed: bool, skipped: bool) {
        let mut report = self.lock();
        report.failed = failed;
        report.skipped = skipped;
    }

    pub fn add_operation(&self, operation: OperationReport) {
        self.lock().operations.push(operation);
    }

    pub fn snapshot(&self) -> TestReport {
        self.lock().clone()
    }
}

#[derive(Debug, Default)]
struct ReportState {
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    tests: Vec<TestReportHandle>,
}

/// Serializable view of the whole run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSnapshot {
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub tests: Vec<TestReport>,
}

/// Run report
#[derive(Debug)]
pub struct Report {
    name: String,
    state: Mutex<ReportState>,
}

impl Report {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(ReportState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_start_time(&self, time: DateTime<Utc>) {
        self.lock().start_time = Some(time);
    }

    pub fn set_end_time(&self, time: DateTime<Utc>) {
        self.lock().end_time = Some(time);
    }

    /// Register a test instance and return its handle
    pub fn for_test(&self, name: &str, id: usize, scenario_id: usize, base_path: &Path) -> TestReportHandle {
        let handle = TestReportHandle(Arc::new(Mutex::new(TestReport {
            name: name.to_string(),
            id,
            scenario_id,
            base_path: base_path.to_path_buf(),
            ..TestReport::default()
        })));
        self.lock().tests.push(handle.clone());
        handle
    }

    pub fn snapshot(&self) -> ReportSnapshot {
        let state = self.lock();
        let mut tests: Vec<TestReport> = state.tests.iter().map(|t| t.snapshot()).collect();
        // Parallel instances register in completion order
        tests.sort_by_key(|t| (t.id, t.scenario_id));
        ReportSnapshot {
            name: self.name.clone(),
            start_time: state.start_time,
            end_time: state.end_time,
            tests,
        }
    }

    /// Write the report as JSON
    pub fn save(&self, path: &Path) -> Result<(), RunnerError> {
        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| RunnerError::Config(format!("failed to encode report: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
