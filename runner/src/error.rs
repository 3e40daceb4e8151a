use crate::cluster::ClientError;
use crate::operations::OperationError;
use common::{BindingError, TemplateError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run (or the scope they occur in)
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("cluster error: {0}")]
    Cluster(String),

    #[error("namespace {namespace}: {message}")]
    Namespace { namespace: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to load test {path}: {message}")]
    Discovery { path: PathBuf, message: String },

    #[error("scheduler error: {0}")]
    Scheduler(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
