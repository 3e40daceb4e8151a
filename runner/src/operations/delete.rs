//! Delete action and deferred deletion
//!
//! Deleting something already gone is success. With `wait`, the action polls
//! until the object disappears (bounded by the operation timeout).

use crate::cluster::{
    register_cluster_bindings, ClientError, ClusterClient, Namespacer, ObjectKey, ResolvedCluster,
};
use crate::operations::cleanup::CleanupStack;
use crate::operations::{Action, Operation, OperationError, OperationInfo, POLL_INTERVAL};
use crate::report::TestReportHandle;
use async_trait::async_trait;
use common::Bindings;
use kube::api::{DynamicObject, PropagationPolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct DeleteAction {
    client: Arc<dyn ClusterClient>,
    object: DynamicObject,
    namespacer: Option<Namespacer>,
    wait: bool,
    propagation: PropagationPolicy,
}

impl DeleteAction {
    pub fn new(
        client: Arc<dyn ClusterClient>,
        object: DynamicObject,
        namespacer: Option<Namespacer>,
        wait: bool,
        propagation: PropagationPolicy,
    ) -> Self {
        Self {
            client,
            object,
            namespacer,
            wait,
            propagation,
        }
    }
}

#[async_trait]
impl Action for DeleteAction {
    async fn exec(&self, bindings: Bindings) -> Result<Bindings, OperationError> {
        let mut object = self.object.clone();
        if let Some(namespacer) = &self.namespacer {
            namespacer.apply(&mut object).await?;
        }
        let key = ObjectKey::from_object(&object)?;

        match self.client.delete(&object, self.propagation.clone()).await {
            Ok(()) => info!(object = %key, "🗑️  Deleted"),
            Err(ClientError::NotFound(_)) => {
                debug!(object = %key, "Already gone");
                return Ok(bindings);
            }
            Err(e) => return Err(e.into()),
        }

        if self.wait {
            loop {
                match self.client.get(&key).await {
                    Err(ClientError::NotFound(_)) => break,
                    Err(e) => return Err(e.into()),
                    Ok(_) => {
                        debug!(object = %key, "Waiting for deletion");
                        tokio::time::sleep(POLL_INTERVAL).await;
                    }
                }
            }
        }

        Ok(bindings)
    }
}

/// A deletion to defer onto a cleanup stack
#[derive(Clone)]
pub struct DeleteCleanup {
    pub cluster: ResolvedCluster,
    pub client: Arc<dyn ClusterClient>,
    pub namespacer: Option<Namespacer>,
    pub wait: bool,
    pub timeout: Duration,
    pub report: Option<TestReportHandle>,
}

impl DeleteCleanup {
    /// Defer deleting `object`; the delete runs with `bindings` refreshed
    /// with the cluster identity at cleanup time
    pub fn register(self, stack: &CleanupStack, object: DynamicObject, bindings: Bindings) {
        stack.defer(move || async move {
            let DeleteCleanup {
                cluster,
                client,
                namespacer,
                wait,
                timeout,
                report,
            } = self;
            let operation = Operation::new(
                OperationInfo::new(0, "delete"),
                true,
                timeout,
                move |bindings: Bindings| async move {
                    let bindings = register_cluster_bindings(&bindings, &cluster);
                    let action = DeleteAction::new(
                        client,
                        object,
                        namespacer,
                        wait,
                        PropagationPolicy::Background,
                    );
                    Ok((Box::new(action) as Box<dyn Action>, bindings))
                },
                report,
            );
            // Failures are logged by the operation and do not change the outcome
            let _ = operation.execute(bindings).await;
        });
    }
}
