use anyhow::{bail, Context, Result};
use ketju::cluster::KubeRegistry;
use ketju::discovery::discover;
use ketju::metrics::gather_runner_metrics;
use ketju::report::Report;
use ketju::{RunnerConfig, Summary, TestsProcessor};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// ketju - declarative Kubernetes tests
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (needed for Kubernetes TLS client)
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok(); // Ignore error if already installed

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🦀 ketju: declarative Kubernetes tests");

    let config_path = env::var("KETJU_CONFIG").ok().map(PathBuf::from);
    let config = RunnerConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    let tests = discover(&config.discovery).context("Failed to discover tests")?;
    info!("📋 Discovered {} test(s)", tests.len());
    info!("   Parallel: {}", config.execution.parallel);
    info!("   Fail fast: {}", config.execution.fail_fast);
    if !config.namespace.name.is_empty() {
        info!("   Namespace: {}", config.namespace.name);
    }

    let config = Arc::new(config);
    let registry = Arc::new(KubeRegistry::new(config.clusters.clone()));
    let summary = Arc::new(Summary::default());
    let report = config
        .report
        .path
        .as_ref()
        .map(|_| Arc::new(Report::new(config.report.name.clone())));

    let processor = TestsProcessor::new(
        config.clone(),
        registry,
        Some(summary.clone()),
        report.clone(),
        tests,
    );
    let result = processor.run(None).await;

    if let (Some(report), Some(path)) = (&report, &config.report.path) {
        match report.save(path) {
            Ok(()) => info!("📝 Report written to {}", path.display()),
            Err(e) => error!("Failed to write report: {}", e),
        }
    }

    if let Some(path) = &config.metrics_path {
        match gather_runner_metrics() {
            Ok(metrics) => std::fs::write(path, metrics)
                .with_context(|| format!("Failed to write metrics to {}", path.display()))?,
            Err(e) => error!("Failed to gather metrics: {}", e),
        }
    }

    result.context("Run aborted")?;

    let counts = summary.counts();
    info!(
        "🏁 Passed: {}, Failed: {}, Skipped: {}",
        counts.passed, counts.failed, counts.skipped
    );

    if counts.failed > 0 {
        bail!("{} test(s) failed", counts.failed);
    }
    Ok(())
}
