//! Command action
//!
//! Runs a local process against a cluster. `$NAMESPACE` in arguments and the
//! `NAMESPACE` environment variable carry the ambient namespace; `KUBECONFIG`
//! and `--context` point kubectl at the resolved cluster.

use crate::config::ClusterConfig;
use crate::kubectl::KUBECTL;
use crate::operations::{Action, OperationError};
use async_trait::async_trait;
use common::{template, Bindings, Command, NAMESPACE_BINDING, NAMESPACE_PLACEHOLDER};
use serde_json::json;
use std::process::Stdio;
use tracing::{debug, info};

/// The bound namespace, if any; without one `$NAMESPACE` is left as is
fn ambient_namespace(bindings: &Bindings) -> Option<&str> {
    bindings
        .get(NAMESPACE_BINDING)
        .and_then(|v| v.as_str())
        .filter(|ns| !ns.is_empty())
}

pub struct CommandAction {
    command: Command,
    cluster: Option<ClusterConfig>,
}

impl CommandAction {
    pub fn new(command: Command, cluster: Option<ClusterConfig>) -> Self {
        Self { command, cluster }
    }

    /// Resolve entrypoint and arguments against `bindings`
    pub fn resolve(&self, bindings: &Bindings) -> Result<(String, Vec<String>), OperationError> {
        let namespace = ambient_namespace(bindings);

        let entrypoint = template::convert_string(&self.command.entrypoint, bindings)?;
        if entrypoint.is_empty() {
            return Err(OperationError::Setup("command has no entrypoint".to_string()));
        }

        let mut args = self
            .command
            .args
            .iter()
            .map(|arg| {
                template::convert_string(arg, bindings).map(|arg| match namespace {
                    Some(namespace) => arg.replace(NAMESPACE_PLACEHOLDER, namespace),
                    None => arg,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if entrypoint == KUBECTL {
            if let Some(context) = self.cluster.as_ref().and_then(|c| c.context.as_deref()) {
                args.push(format!("--context={}", context));
            }
        }

        Ok((entrypoint, args))
    }
}

#[async_trait]
impl Action for CommandAction {
    async fn exec(&self, bindings: Bindings) -> Result<Bindings, OperationError> {
        let (entrypoint, args) = self.resolve(&bindings)?;

        let mut process = tokio::process::Command::new(&entrypoint);
        process
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(namespace) = ambient_namespace(&bindings) {
            process.env("NAMESPACE", namespace);
        }
        if let Some(kubeconfig) = self.cluster.as_ref().and_then(|c| c.kubeconfig.as_ref()) {
            process.env("KUBECONFIG", kubeconfig);
        }

        debug!(entrypoint = %entrypoint, ?args, "Running command");
        let output = process.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(OperationError::Command(format!(
                "{} exited with {}: {}",
                entrypoint,
                output.status,
                stderr.trim()
            )));
        }

        info!(entrypoint = %entrypoint, "Command succeeded");
        Ok(bindings
            .register("stdout", json!(stdout))
            .register("stderr", json!(stderr)))
    }
}
