//! Configuration for the ketju runner
//!
//! Loaded from a TOML file, then overridden from `KETJU_*` environment variables.

use crate::error::RunnerError;
use common::TimeoutOverrides;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runner configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunnerConfig {
    /// Namespace shared by every test of the run
    #[serde(default)]
    pub namespace: NamespaceConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub report: ReportConfig,

    /// Named clusters tests may target
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterConfig>,

    /// Write Prometheus text exposition here after the run
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,
}

/// Run-level namespace (empty name disables provisioning)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NamespaceConfig {
    #[serde(default)]
    pub name: String,

    /// Merged over the namespace object before creation
    #[serde(default)]
    pub template: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Keep resources created by the run (default: false)
    #[serde(default)]
    pub skip_delete: bool,
}

/// Default operation timeouts in seconds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_apply_timeout")]
    pub apply_secs: u64,

    #[serde(default = "default_assert_timeout")]
    pub assert_secs: u64,

    #[serde(default = "default_cleanup_timeout")]
    pub cleanup_secs: u64,

    #[serde(default = "default_delete_timeout")]
    pub delete_secs: u64,

    #[serde(default = "default_exec_timeout")]
    pub exec_secs: u64,
}

fn default_apply_timeout() -> u64 {
    5
}

fn default_assert_timeout() -> u64 {
    30
}

fn default_cleanup_timeout() -> u64 {
    30
}

fn default_delete_timeout() -> u64 {
    15
}

fn default_exec_timeout() -> u64 {
    5
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            apply_secs: default_apply_timeout(),
            assert_secs: default_assert_timeout(),
            cleanup_secs: default_cleanup_timeout(),
            delete_secs: default_delete_timeout(),
            exec_secs: default_exec_timeout(),
        }
    }
}

impl TimeoutConfig {
    /// Timeouts with a test's overrides applied
    pub fn with_overrides(&self, overrides: &TimeoutOverrides) -> Self {
        Self {
            apply_secs: overrides.apply_secs.unwrap_or(self.apply_secs),
            assert_secs: overrides.assert_secs.unwrap_or(self.assert_secs),
            cleanup_secs: overrides.cleanup_secs.unwrap_or(self.cleanup_secs),
            delete_secs: overrides.delete_secs.unwrap_or(self.delete_secs),
            exec_secs: overrides.exec_secs.unwrap_or(self.exec_secs),
        }
    }

    pub fn apply(&self) -> Duration {
        Duration::from_secs(self.apply_secs)
    }

    pub fn assert(&self) -> Duration {
        Duration::from_secs(self.assert_secs)
    }

    pub fn cleanup(&self) -> Duration {
        Duration::from_secs(self.cleanup_secs)
    }

    pub fn delete(&self) -> Duration {
        Duration::from_secs(self.delete_secs)
    }

    pub fn exec(&self) -> Duration {
        Duration::from_secs(self.exec_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionConfig {
    /// Skip tests not yet started once one has failed
    #[serde(default)]
    pub fail_fast: bool,

    /// Maximum number of tests running at once (default: number of CPUs)
    #[serde(default = "default_parallel")]
    pub parallel: usize,
}

fn default_parallel() -> usize {
    num_cpus::get()
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            parallel: default_parallel(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// Prefix test names with their directory
    #[serde(default)]
    pub full_name: bool,

    #[serde(default = "default_test_dirs")]
    pub test_dirs: Vec<PathBuf>,

    #[serde(default = "default_test_file")]
    pub test_file: String,
}

fn default_test_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_test_file() -> String {
    "ketju-test.json".to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            full_name: false,
            test_dirs: default_test_dirs(),
            test_file: default_test_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Where to write the JSON report (no report when unset)
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_report_name")]
    pub name: String,
}

fn default_report_name() -> String {
    "ketju-report".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: None,
            name: default_report_name(),
        }
    }
}

/// Connection settings for a named cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClusterConfig {
    /// Kubeconfig file (default kubeconfig when unset)
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context (current context when unset)
    #[serde(default)]
    pub context: Option<String>,
}

impl RunnerConfig {
    /// Parse a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, RunnerError> {
        toml::from_str(contents).map_err(|e| RunnerError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, RunnerError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from `path` (defaults when unset) and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, RunnerError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `KETJU_*` environment overrides
    pub fn apply_env(&mut self) -> Result<(), RunnerError> {
        if let Ok(val) = env::var("KETJU_NAMESPACE") {
            self.namespace.name = val;
        }

        if let Ok(val) = env::var("KETJU_FAIL_FAST") {
            self.execution.fail_fast = parse_env("KETJU_FAIL_FAST", &val)?;
        }

        if let Ok(val) = env::var("KETJU_PARALLEL") {
            self.execution.parallel = parse_env("KETJU_PARALLEL", &val)?;
        }

        if let Ok(val) = env::var("KETJU_SKIP_DELETE") {
            self.cleanup.skip_delete = parse_env("KETJU_SKIP_DELETE", &val)?;
        }

        if let Ok(val) = env::var("KETJU_REPORT_PATH") {
            self.report.path = Some(PathBuf::from(val));
        }

        if let Ok(val) = env::var("KETJU_TEST_DIRS") {
            self.discovery.test_dirs = env::split_paths(&val).collect();
        }

        Ok(())
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T, RunnerError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| RunnerError::Config(format!("invalid {} '{}': {}", name, value, e)))
}
