//! Operations
//!
//! An [`Operation`] wraps a cluster-affecting action behind a lazily invoked
//! factory. The action is materialized from the bindings current at execution
//! time (not at registration time), run under a timeout, and whatever
//! bindings it produces flow forward to later operations.

pub mod assert;
pub mod cleanup;
pub mod command;
pub mod create;
pub mod delete;
pub mod sleep;

use crate::cluster::ClientError;
use crate::kubectl::CollectorError;
use crate::metrics::record_operation;
use crate::report::{OperationReport, TestReportHandle};
use async_trait::async_trait;
use chrono::Utc;
use common::{Bindings, TemplateError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

pub use assert::AssertAction;
pub use cleanup::CleanupStack;
pub use command::CommandAction;
pub use create::CreateAction;
pub use delete::{DeleteAction, DeleteCleanup};
pub use sleep::SleepAction;

/// Interval between polls of eventually consistent cluster state
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Operation errors
#[derive(Error, Debug)]
pub enum OperationError {
    /// The action could not be built; fatal to the enclosing scope
    #[error("setup failed: {0}")]
    Setup(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Collector(#[from] CollectorError),

    #[error("command failed: {0}")]
    Command(String),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OperationError {
    pub fn is_setup(&self) -> bool {
        matches!(self, OperationError::Setup(_))
    }
}

/// An executable action
#[async_trait]
pub trait Action: Send + Sync {
    /// Run the action; returns the bindings visible to later operations
    async fn exec(&self, bindings: Bindings) -> Result<Bindings, OperationError>;
}

/// Builds an action from the bindings current at execution time
pub type ActionFactory = Box<
    dyn FnOnce(Bindings) -> BoxFuture<'static, Result<(Box<dyn Action>, Bindings), OperationError>>
        + Send,
>;

/// Display metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationInfo {
    /// 1-based position within its block (0 for run-level operations)
    pub id: usize,
    pub operation_type: String,
    pub step: Option<String>,
}

impl OperationInfo {
    pub fn new(id: usize, operation_type: impl Into<String>) -> Self {
        Self {
            id,
            operation_type: operation_type.into(),
            step: None,
        }
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }
}

impl fmt::Display for OperationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            Some(step) => write!(f, "{}/{}-{}", step, self.operation_type, self.id),
            None => write!(f, "{}-{}", self.operation_type, self.id),
        }
    }
}

/// Resolve an operation timeout: explicit override, else the default
pub fn timeout(override_secs: Option<u64>, default: Duration) -> Duration {
    override_secs.map(Duration::from_secs).unwrap_or(default)
}

/// Timeout-bounded, lazily materialized action
pub struct Operation {
    info: OperationInfo,
    cleanup: bool,
    timeout: Duration,
    factory: ActionFactory,
    report: Option<TestReportHandle>,
}

impl Operation {
    pub fn new<F, Fut>(
        info: OperationInfo,
        cleanup: bool,
        timeout: Duration,
        factory: F,
        report: Option<TestReportHandle>,
    ) -> Self
    where
        F: FnOnce(Bindings) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(Box<dyn Action>, Bindings), OperationError>> + Send + 'static,
    {
        Self {
            info,
            cleanup,
            timeout,
            factory: Box::new(move |bindings| factory(bindings).boxed()),
            report,
        }
    }

    pub fn info(&self) -> &OperationInfo {
        &self.info
    }

    pub fn is_cleanup(&self) -> bool {
        self.cleanup
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Materialize and run the action
    pub async fn execute(self, bindings: Bindings) -> Result<Bindings, OperationError> {
        let Operation {
            info,
            cleanup,
            timeout,
            factory,
            report,
        } = self;

        let start_time = Utc::now();
        let start = Instant::now();
        debug!(operation = %info, cleanup, ?timeout, "Running operation");

        let result = match factory(bindings).await {
            Ok((action, bindings)) => match tokio::time::timeout(timeout, action.exec(bindings)).await {
                Ok(result) => result,
                Err(_) => Err(OperationError::Timeout(timeout)),
            },
            Err(OperationError::Setup(message)) => Err(OperationError::Setup(message)),
            Err(e) => Err(OperationError::Setup(e.to_string())),
        };

        let outcome = if result.is_ok() { "success" } else { "error" };
        record_operation(&info.operation_type, start.elapsed().as_secs_f64(), outcome);

        match &result {
            Ok(_) => debug!(operation = %info, "Operation done"),
            Err(e) => warn!(operation = %info, cleanup, error = %e, "Operation failed"),
        }

        if let Some(report) = report {
            report.add_operation(OperationReport {
                name: info.to_string(),
                operation_type: info.operation_type.clone(),
                cleanup,
                start_time,
                end_time: Utc::now(),
                error: result.as_ref().err().map(|e| e.to_string()),
            });
        }

        result
    }
}
