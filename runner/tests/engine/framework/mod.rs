//! Engine test framework
//!
//! - cluster: in-memory cluster client and resource mapper
//! - registry: resolves cluster names to fake clusters
//! - processors: scripted per-test processors recording what ran

pub mod processors;
pub mod registry;

pub use cluster::{Call, FakeCluster};
pub use processors::ScriptedFactory;
pub use registry::FakeRegistry;

use common::{Metadata, Test, TestSpec};
use ketju::RunnerConfig;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Base configuration shared by engine tests
pub fn config() -> RunnerConfig {
    RunnerConfig::from_toml(include_str!("../config.toml")).expect("Should parse test config")
}

/// Build a named test from its spec document
pub fn test(name: &str, spec: Value) -> Test {
    Test {
        base_path: PathBuf::from("suite").join(name),
        metadata: Metadata {
            name: name.to_string(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        },
        spec: serde_json::from_value::<TestSpec>(spec).expect("Should parse test spec"),
    }
}

/// Build a test whose scripted processor behaves as `labels` say
/// (`outcome: fail|panic`, `delayMs: <n>`)
pub fn scripted(name: &str, labels: &[(&str, &str)], spec: Value) -> Test {
    let mut test = test(name, spec);
    test.metadata.labels = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    test
}

/// JSON for a namespace object
pub fn namespace(name: &str) -> kube::api::DynamicObject {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {"name": name}
    }))
    .expect("Should build namespace")
}
