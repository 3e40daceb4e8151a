//! Default steps processor end to end against an in-memory cluster

use crate::engine::framework::{config, test, FakeCluster, FakeRegistry};
use ketju::report::Report;
use ketju::{RunnerConfig, Summary, TestsProcessor};
use serde_json::json;
use std::sync::Arc;

async fn run_steps(config: RunnerConfig, registry: Arc<FakeRegistry>, tests: Vec<common::Test>) -> (Arc<Summary>, Arc<Report>) {
    let summary = Arc::new(Summary::default());
    let report = Arc::new(Report::new("steps"));
    TestsProcessor::new(
        Arc::new(config),
        registry,
        Some(summary.clone()),
        Some(report.clone()),
        tests,
    )
    .run(None)
    .await
    .expect("Run should complete");
    (summary, report)
}

fn configmap(name: &str) -> serde_json::Value {
    json!({"create": {"resource": {
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {"name": name},
        "data": {"owner": "($namespace)"}
    }}})
}

#[tokio::test]
async fn created_resources_are_deleted_in_reverse_order() {
    let registry = Arc::new(FakeRegistry::new());
    let tests = vec![test(
        "lifecycle",
        json!({
            "namespace": "lifecycle",
            "steps": [
                {"try": [configmap("a"), configmap("b")]},
                {"try": [configmap("c")]}
            ]
        }),
    )];

    let (summary, _) = run_steps(config(), registry.clone(), tests).await;

    assert_eq!(summary.passed(), 1);
    assert_eq!(
        registry.default.creates(),
        vec![
            "v1/Namespace lifecycle",
            "v1/ConfigMap lifecycle/a",
            "v1/ConfigMap lifecycle/b",
            "v1/ConfigMap lifecycle/c",
        ]
    );
    assert_eq!(
        registry.default.deletes(),
        vec![
            "v1/ConfigMap lifecycle/c",
            "v1/ConfigMap lifecycle/b",
            "v1/ConfigMap lifecycle/a",
            "v1/Namespace lifecycle",
        ]
    );
}

#[tokio::test]
async fn templates_resolve_against_test_bindings() {
    let registry = Arc::new(FakeRegistry::new());
    let tests = vec![test(
        "templated",
        json!({
            "namespace": "templated",
            "skipDelete": true,
            "bindings": [{"name": "suffix", "value": "($test.metadata.name)"}],
            "steps": [{"try": [
                {"create": {"resource": {
                    "apiVersion": "v1",
                    "kind": "ConfigMap",
                    "metadata": {"name": "($suffix)"},
                    "data": {"namespace": "($namespace)"}
                }}},
                {"assert": {"resource": {
                    "apiVersion": "v1",
                    "kind": "ConfigMap",
                    "metadata": {"name": "templated"},
                    "data": {"namespace": "templated"}
                }}}
            ]}]
        }),
    )];

    let (summary, _) = run_steps(config(), registry.clone(), tests).await;

    assert_eq!(summary.passed(), 1);
    assert!(registry.default.contains("v1/ConfigMap templated/templated"));
    assert!(registry.default.deletes().is_empty(), "skipDelete keeps everything");
}

#[tokio::test]
async fn failed_operation_stops_the_test_and_runs_catch() {
    let registry = Arc::new(FakeRegistry::new());
    registry.default.break_kind("Secret");
    let tests = vec![test(
        "broken",
        json!({
            "namespace": "broken",
            "steps": [
                {
                    "name": "setup",
                    "try": [
                        configmap("before"),
                        {"create": {"resource": {
                            "apiVersion": "v1",
                            "kind": "Secret",
                            "metadata": {"name": "rejected"}
                        }}},
                        configmap("never")
                    ],
                    "catch": [{"command": {"entrypoint": "ketju-test-missing-binary"}}]
                },
                {"try": [configmap("unreached")]}
            ]
        }),
    )];

    let (summary, report) = run_steps(config(), registry.clone(), tests).await;

    assert_eq!(summary.failed(), 1);
    assert_eq!(
        registry.default.creates(),
        vec![
            "v1/Namespace broken",
            "v1/ConfigMap broken/before",
            "v1/Secret broken/rejected",
        ]
    );
    // Cleanup still runs after a failure
    assert_eq!(
        registry.default.deletes(),
        vec!["v1/ConfigMap broken/before", "v1/Namespace broken"]
    );

    let snapshot = report.snapshot();
    let operations: Vec<&str> = snapshot.tests[0]
        .operations
        .iter()
        .filter(|op| !op.cleanup)
        .map(|op| op.name.as_str())
        .collect();
    assert_eq!(operations, vec!["setup/create-1", "setup/create-2", "setup/command-1"]);
}

#[tokio::test]
async fn assert_times_out_when_object_never_matches() {
    let registry = Arc::new(FakeRegistry::new());
    let tests = vec![test(
        "mismatch",
        json!({
            "namespace": "mismatch",
            "steps": [{"try": [
                configmap("settings"),
                {"assert": {
                    "timeoutSecs": 1,
                    "resource": {
                        "apiVersion": "v1",
                        "kind": "ConfigMap",
                        "metadata": {"name": "settings"},
                        "data": {"owner": "someone-else"}
                    }
                }}
            ]}]
        }),
    )];

    let (summary, report) = run_steps(config(), registry, tests).await;

    assert_eq!(summary.failed(), 1);
    let snapshot = report.snapshot();
    let assert_op = snapshot.tests[0]
        .operations
        .iter()
        .find(|op| op.operation_type == "assert")
        .expect("Should record the assert");
    assert!(assert_op.error.as_deref().unwrap_or_default().contains("timed out"));
}

#[tokio::test]
async fn delete_operation_tolerates_missing_objects() {
    let registry = Arc::new(FakeRegistry::new());
    let tests = vec![test(
        "deleter",
        json!({
            "namespace": "deleter",
            "skipDelete": true,
            "steps": [{"try": [
                configmap("doomed"),
                {"delete": {"ref": {"apiVersion": "v1", "kind": "ConfigMap", "name": "doomed"}, "wait": true}},
                {"delete": {"ref": {"apiVersion": "v1", "kind": "ConfigMap", "name": "ghost"}}}
            ]}]
        }),
    )];

    let (summary, _) = run_steps(config(), registry.clone(), tests).await;

    assert_eq!(summary.passed(), 1);
    assert!(!registry.default.contains("v1/ConfigMap deleter/doomed"));
}

#[tokio::test]
async fn generated_namespace_when_none_is_configured() {
    let registry = Arc::new(FakeRegistry::new());
    let tests = vec![test("anonymous", json!({"steps": [{"try": [configmap("x")]}]}))];

    let (summary, _) = run_steps(config(), registry.clone(), tests).await;

    assert_eq!(summary.passed(), 1);
    let creates = registry.default.creates();
    assert!(creates[0].starts_with("v1/Namespace ketju-"), "got {:?}", creates);
    assert_eq!(registry.default.deletes().last(), creates.first());
}

#[tokio::test]
async fn test_cluster_gets_its_own_namespace() {
    let staging = Arc::new(FakeCluster::new());
    let registry = Arc::new(FakeRegistry::new().with_cluster("staging", staging.clone()));
    let mut config = config();
    config.namespace.name = "shared".to_string();
    let tests = vec![test(
        "remote",
        json!({
            "cluster": "staging",
            "namespace": "remote",
            "steps": [{"try": [configmap("settings")]}]
        }),
    )];

    let (summary, _) = run_steps(config, registry.clone(), tests).await;

    assert_eq!(summary.passed(), 1);
    assert_eq!(registry.default.creates(), vec!["v1/Namespace shared"]);
    assert_eq!(
        staging.creates(),
        vec!["v1/Namespace remote", "v1/ConfigMap remote/settings"]
    );
}

#[tokio::test]
async fn unknown_cluster_fails_only_that_test() {
    let registry = Arc::new(FakeRegistry::new());
    let tests = vec![
        test("lost", json!({"cluster": "nowhere", "steps": []})),
        test("home", json!({"namespace": "home", "steps": []})),
    ];

    let (summary, _) = run_steps(config(), registry, tests).await;

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.passed(), 1);
}
