//! Declarative test model
//!
//! Tests are Kubernetes-style documents (`metadata` + `spec`). Every string
//! field documented as templated is resolved against the binding context at
//! execution time, never at load time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Object metadata carried by a test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// A discovered test
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    /// Directory the test was loaded from (set by discovery)
    #[serde(skip)]
    pub base_path: PathBuf,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: TestSpec,
}

impl Test {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Per-test timeout overrides (seconds)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutOverrides {
    pub apply_secs: Option<u64>,
    pub assert_secs: Option<u64>,
    pub cleanup_secs: Option<u64>,
    pub delete_secs: Option<u64>,
    pub exec_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSpec {
    #[serde(default)]
    pub description: Option<String>,

    /// Named cluster to run against (default cluster when unset)
    #[serde(default)]
    pub cluster: Option<String>,

    /// Whether the test may run alongside others (default: true)
    #[serde(default)]
    pub concurrent: Option<bool>,

    #[serde(default)]
    pub skip: Option<bool>,

    #[serde(default)]
    pub skip_delete: Option<bool>,

    /// Namespace for this test when the run does not provide one
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub timeouts: TimeoutOverrides,

    #[serde(default)]
    pub bindings: Vec<Binding>,

    #[serde(default)]
    pub scenarios: Vec<Scenario>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl TestSpec {
    pub fn is_concurrent(&self) -> bool {
        self.concurrent.unwrap_or(true)
    }

    pub fn is_skipped(&self) -> bool {
        self.skip.unwrap_or(false)
    }
}

/// A named binding; `value` may contain templated strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    pub value: Value,
}

/// Variant of a test supplying its own binding overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub skip_delete: Option<bool>,
    #[serde(default, rename = "try")]
    pub try_: Vec<Operation>,
    #[serde(default)]
    pub catch: Vec<Collect>,
    #[serde(default)]
    pub finally: Vec<Collect>,
    #[serde(default)]
    pub cleanup: Vec<Collect>,
}

/// Primary operations a step performs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Create(Create),
    Delete(Delete),
    Assert(Assert),
    Command(Command),
    Sleep(Sleep),
}

impl Operation {
    pub fn type_name(&self) -> &'static str {
        match self {
            Operation::Create(_) => "create",
            Operation::Delete(_) => "delete",
            Operation::Assert(_) => "assert",
            Operation::Command(_) => "command",
            Operation::Sleep(_) => "sleep",
        }
    }
}

/// Diagnostic collectors run from `catch`, `finally` and `cleanup` blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collect {
    PodLogs(PodLogs),
    Describe(Describe),
    Command(Command),
}

impl Collect {
    pub fn type_name(&self) -> &'static str {
        match self {
            Collect::PodLogs(_) => "logs",
            Collect::Describe(_) => "describe",
            Collect::Command(_) => "command",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Create {
    pub resource: Value,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delete {
    #[serde(rename = "ref")]
    pub reference: ObjectReference,
    /// Wait until the object is gone
    #[serde(default)]
    pub wait: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// A condition expected to hold: the referenced object must exist and
/// contain every field given in the expected resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assert {
    /// Overrides the configured assert timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// JSON file holding the expected resource, relative to the test directory
    #[serde(default)]
    pub file: Option<String>,
    /// Inline expected resource
    #[serde(default)]
    pub resource: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sleep {
    pub duration_ms: u64,
}

/// A command to run against a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub entrypoint: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Target cluster name; empty means the default cluster
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Command {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Collect container logs (all string fields are templated)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodLogs {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub container: String,
    #[serde(default)]
    pub tail: Option<i64>,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Reference to a resource type, either by `apiVersion`/`kind` or by resource name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub resource: String,
}

/// Describe resources (all string fields are templated)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Describe {
    #[serde(flatten)]
    pub resource: ResourceReference,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub show_events: Option<bool>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}
