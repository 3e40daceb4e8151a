//! Scheduling: outcomes, fail-fast, scenario expansion, run namespace

use crate::engine::framework::{config, scripted, test, FakeRegistry, ScriptedFactory};
use ketju::processors::SummaryCounts;
use ketju::report::Report;
use ketju::{RunnerConfig, RunnerError, Summary, TestsProcessor};
use serde_json::json;
use std::sync::Arc;

struct Run {
    summary: Arc<Summary>,
    factory: Arc<ScriptedFactory>,
    registry: Arc<FakeRegistry>,
    result: Result<(), RunnerError>,
}

async fn run(config: RunnerConfig, registry: FakeRegistry, tests: Vec<common::Test>) -> Run {
    let summary = Arc::new(Summary::default());
    let factory = Arc::new(ScriptedFactory::new());
    let registry = Arc::new(registry);
    let processor = TestsProcessor::new(
        Arc::new(config),
        registry.clone(),
        Some(summary.clone()),
        None,
        tests,
    )
    .with_factory(factory.clone());

    let result = processor.run(None).await;
    Run {
        summary,
        factory,
        registry,
        result,
    }
}

fn counts(passed: u32, failed: u32, skipped: u32) -> SummaryCounts {
    SummaryCounts {
        passed,
        failed,
        skipped,
    }
}

#[tokio::test]
async fn failing_and_passing_tests_are_both_counted() {
    let tests = vec![
        scripted("broken", &[("outcome", "fail")], json!({})),
        scripted("healthy", &[], json!({})),
    ];

    let run = run(config(), FakeRegistry::new(), tests).await;

    run.result.expect("Run should complete");
    assert_eq!(run.summary.counts(), counts(1, 1, 0));
    let mut executed = run.factory.executed();
    executed.sort();
    assert_eq!(executed, vec!["broken", "healthy"]);
}

#[tokio::test]
async fn fail_fast_skips_instances_not_yet_started() {
    let mut config = config();
    config.execution.fail_fast = true;
    config.execution.parallel = 2;
    let tests = vec![
        scripted("first", &[("outcome", "fail")], json!({})),
        scripted("second", &[("delayMs", "200")], json!({})),
        scripted("third", &[], json!({})),
    ];

    let run = run(config, FakeRegistry::new(), tests).await;

    run.result.expect("Run should complete");
    // `second` was already running and keeps its own outcome
    assert_eq!(run.summary.counts(), counts(1, 1, 1));
    let mut executed = run.factory.executed();
    executed.sort();
    assert_eq!(executed, vec!["first", "second"]);
}

#[tokio::test]
async fn failures_do_not_skip_without_fail_fast() {
    let mut config = config();
    config.execution.parallel = 1;
    let tests = vec![
        scripted("first", &[("outcome", "fail")], json!({})),
        scripted("second", &[], json!({})),
    ];

    let run = run(config, FakeRegistry::new(), tests).await;

    assert_eq!(run.summary.counts(), counts(1, 1, 0));
    assert_eq!(run.factory.executed(), vec!["first", "second"]);
}

#[tokio::test]
async fn skipped_tests_never_reach_a_processor() {
    let tests = vec![
        test("skipped", json!({"skip": true})),
        test("run", json!({"skip": false})),
    ];

    let run = run(config(), FakeRegistry::new(), tests).await;

    assert_eq!(run.summary.counts(), counts(1, 0, 1));
    assert_eq!(run.factory.executed(), vec!["run"]);
}

#[tokio::test]
async fn panicking_processor_fails_its_instance() {
    let tests = vec![
        scripted("explodes", &[("outcome", "panic")], json!({})),
        scripted("fine", &[], json!({})),
    ];

    let run = run(config(), FakeRegistry::new(), tests).await;

    run.result.expect("A panic stays within its instance");
    assert_eq!(run.summary.counts(), counts(1, 1, 0));
}

#[tokio::test]
async fn scenarios_expand_into_instances_in_order() {
    let mut config = config();
    config.execution.parallel = 1;
    let tests = vec![
        test(
            "matrix",
            json!({
                "concurrent": false,
                "bindings": [{"name": "image", "value": "nginx"}],
                "scenarios": [
                    {"bindings": [{"name": "env", "value": "dev"}]},
                    {"bindings": [{"name": "env", "value": "prod"}]}
                ]
            }),
        ),
        test("plain", json!({"bindings": [{"name": "image", "value": "redis"}]})),
    ];

    let run = run(config, FakeRegistry::new(), tests).await;
    let executions = run.factory.executions();

    assert_eq!(run.factory.executed(), vec!["matrix[1]", "matrix[2]", "plain"]);
    assert_eq!(
        executions[1].bindings,
        vec![
            ("env".to_string(), json!("prod")),
            ("image".to_string(), json!("nginx"))
        ]
    );

    let infos: Vec<(u64, u64)> = executions
        .iter()
        .map(|e| {
            let info = e.test.as_ref().expect("Should bind test info");
            (
                info["id"].as_u64().unwrap_or_default(),
                info["scenarioId"].as_u64().unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(infos, vec![(1, 1), (1, 2), (2, 1)]);
    assert_eq!(executions[2].test.as_ref().unwrap()["metadata"]["name"], "plain");
}

#[tokio::test]
async fn run_namespace_is_provisioned_then_deleted() {
    let mut config = config();
    config.namespace.name = "ketju-run".to_string();
    let tests = vec![scripted("a", &[], json!({})), scripted("b", &[], json!({}))];

    let run = run(config, FakeRegistry::new(), tests).await;

    run.result.expect("Run should complete");
    for execution in run.factory.executions() {
        assert_eq!(execution.namespace, Some(json!("ketju-run")));
    }
    assert_eq!(run.registry.default.creates(), vec!["v1/Namespace ketju-run"]);
    assert_eq!(run.registry.default.deletes(), vec!["v1/Namespace ketju-run"]);
}

#[tokio::test]
async fn cluster_failure_aborts_before_scheduling() {
    let tests = vec![scripted("never", &[], json!({}))];

    let run = run(config(), FakeRegistry::new().unreachable(), tests).await;

    assert!(matches!(run.result, Err(RunnerError::Cluster(_))));
    assert!(run.factory.executed().is_empty());
    assert_eq!(run.summary.counts(), counts(0, 0, 0));
}

#[tokio::test]
async fn unnamed_test_aborts_before_scheduling() {
    let tests = vec![scripted("ok", &[], json!({})), test("", json!({}))];

    let run = run(config(), FakeRegistry::new(), tests).await;

    assert!(matches!(run.result, Err(RunnerError::Scheduler(_))));
    assert!(run.factory.executed().is_empty());
}

#[tokio::test]
async fn report_records_every_instance() {
    let report = Arc::new(Report::new("engine"));
    let processor = TestsProcessor::new(
        Arc::new(config()),
        Arc::new(FakeRegistry::new()),
        None,
        Some(report.clone()),
        vec![
            scripted("broken", &[("outcome", "fail")], json!({})),
            test("skipped", json!({"skip": true})),
        ],
    )
    .with_factory(Arc::new(ScriptedFactory::new()));

    processor.run(None).await.expect("Run should complete");

    let snapshot = report.snapshot();
    assert!(snapshot.start_time.is_some());
    assert!(snapshot.end_time.is_some());
    assert_eq!(snapshot.tests.len(), 2);
    assert!(snapshot.tests[0].failed);
    assert!(snapshot.tests[1].skipped);
}
