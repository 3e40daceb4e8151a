//! ketju test engine
//!
//! Runs declarative Kubernetes tests: resolves clusters, provisions
//! namespaces, schedules test instances (concurrently when allowed) and
//! executes their operations under timeouts with deferred, LIFO cleanup.

pub mod cluster;
pub mod config;
pub mod discovery;
pub mod error;
pub mod kubectl;
pub mod metrics;
pub mod operations;
pub mod processors;
pub mod report;

pub use config::RunnerConfig;
pub use error::RunnerError;
pub use processors::{Summary, TestsProcessor};
