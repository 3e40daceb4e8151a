//! Scripted per-test processors
//!
//! Behavior comes from the test's labels: `outcome` (`fail` or `panic`) and
//! `delayMs`. Every run is recorded with the bindings it received.

use async_trait::async_trait;
use common::Bindings;
use ketju::cluster::Namespacer;
use ketju::processors::{ProcessorFactory, TestInstance, TestProcessor, TestScope};
use ketju::report::TestReportHandle;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded processor run
#[derive(Debug, Clone)]
pub struct Execution {
    pub name: String,
    pub test: Option<Value>,
    pub namespace: Option<Value>,
    pub bindings: Vec<(String, Value)>,
}

#[derive(Default)]
pub struct ScriptedFactory {
    executions: Arc<Mutex<Vec<Execution>>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.executions.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executions().into_iter().map(|e| e.name).collect()
    }
}

impl ProcessorFactory for ScriptedFactory {
    fn create(
        &self,
        instance: &TestInstance,
        _report: Option<TestReportHandle>,
    ) -> Arc<dyn TestProcessor> {
        let labels = &instance.test.metadata.labels;
        Arc::new(ScriptedProcessor {
            name: instance.identity.to_string(),
            bindings: instance
                .test
                .spec
                .bindings
                .iter()
                .map(|b| (b.name.clone(), b.value.clone()))
                .collect(),
            outcome: labels.get("outcome").cloned().unwrap_or_default(),
            delay: Duration::from_millis(
                labels
                    .get("delayMs")
                    .and_then(|d| d.parse().ok())
                    .unwrap_or(0),
            ),
            executions: self.executions.clone(),
        })
    }
}

struct ScriptedProcessor {
    name: String,
    bindings: Vec<(String, Value)>,
    outcome: String,
    delay: Duration,
    executions: Arc<Mutex<Vec<Execution>>>,
}

#[async_trait]
impl TestProcessor for ScriptedProcessor {
    async fn run(&self, scope: Arc<TestScope>, bindings: Bindings, _namespacer: Option<Namespacer>) {
        self.executions.lock().unwrap().push(Execution {
            name: self.name.clone(),
            test: bindings.get("test").cloned(),
            namespace: bindings.get("namespace").cloned(),
            bindings: self.bindings.clone(),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.outcome.as_str() {
            "fail" => scope.fail(),
            "panic" => panic!("scripted panic in {}", self.name),
            _ => {}
        }
    }
}
