//! Test processors
//!
//! - tests: run-level scheduler (cluster, namespace, scenario expansion,
//!   parallelism, fail-fast, outcome bookkeeping)
//! - test: default per-test processor running a test's steps
//! - namespace: get-or-create namespace provisioning
//! - scope / summary: per-instance outcome and run-wide counters

pub mod namespace;
pub mod scope;
pub mod summary;

use crate::cluster::Namespacer;
use crate::report::TestReportHandle;
use async_trait::async_trait;
use common::{Bindings, Metadata, Test};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub use namespace::NamespaceProvisioner;
pub use scope::{TestScope, TestStatus};
pub use summary::{FailFast, Summary, SummaryCounts};
pub use test::{StepsFactory, StepsProcessor};
pub use tests::TestsProcessor;

/// Value of the `test` binding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestInfo {
    pub id: usize,
    pub scenario_id: usize,
    pub metadata: Metadata,
}

/// Deterministic identity of a test instance
///
/// `id` and `scenario_id` are 1-based declaration ordinals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestIdentity {
    pub name: String,
    pub id: usize,
    pub scenario_id: usize,
    scenarios: usize,
}

impl TestIdentity {
    pub fn new(name: impl Into<String>, id: usize, scenario_id: usize, scenarios: usize) -> Self {
        Self {
            name: name.into(),
            id,
            scenario_id,
            scenarios,
        }
    }
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scenarios == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}[{}]", self.name, self.scenario_id)
        }
    }
}

/// A schedulable test: one scenario of one test, bindings already expanded
#[derive(Debug, Clone)]
pub struct TestInstance {
    pub identity: TestIdentity,
    pub test: Test,
}

impl TestInstance {
    pub fn info(&self) -> TestInfo {
        TestInfo {
            id: self.identity.id,
            scenario_id: self.identity.scenario_id,
            metadata: self.test.metadata.clone(),
        }
    }
}

/// Runs the operations of one test instance
///
/// Must record failures (and skips) on `scope`. Invoked concurrently for
/// distinct instances.
#[async_trait]
pub trait TestProcessor: Send + Sync {
    async fn run(&self, scope: Arc<TestScope>, bindings: Bindings, namespacer: Option<Namespacer>);
}

/// Creates the processor of each instance
pub trait ProcessorFactory: Send + Sync {
    fn create(&self, instance: &TestInstance, report: Option<TestReportHandle>) -> Arc<dyn TestProcessor>;
}
