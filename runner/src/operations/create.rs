//! Create action

use crate::cluster::{ClusterClient, Namespacer, ObjectKey};
use crate::operations::cleanup::CleanupStack;
use crate::operations::delete::DeleteCleanup;
use crate::operations::{Action, OperationError};
use async_trait::async_trait;
use common::{template, Bindings};
use kube::api::DynamicObject;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Decode a resolved resource document
pub(crate) fn to_object(value: Value) -> Result<DynamicObject, OperationError> {
    serde_json::from_value(value)
        .map_err(|e| OperationError::Setup(format!("invalid resource: {}", e)))
}

/// Creates a templated resource, deferring its deletion once it exists
pub struct CreateAction {
    client: Arc<dyn ClusterClient>,
    resource: Value,
    namespacer: Option<Namespacer>,
    cleanup: Option<(Arc<CleanupStack>, DeleteCleanup)>,
}

impl CreateAction {
    pub fn new(
        client: Arc<dyn ClusterClient>,
        resource: Value,
        namespacer: Option<Namespacer>,
    ) -> Self {
        Self {
            client,
            resource,
            namespacer,
            cleanup: None,
        }
    }

    /// Delete the created object when `stack` drains
    pub fn with_cleanup(mut self, stack: Arc<CleanupStack>, cleanup: DeleteCleanup) -> Self {
        self.cleanup = Some((stack, cleanup));
        self
    }
}

#[async_trait]
impl Action for CreateAction {
    async fn exec(&self, bindings: Bindings) -> Result<Bindings, OperationError> {
        let mut object = to_object(template::convert_value(&self.resource, &bindings)?)?;
        if let Some(namespacer) = &self.namespacer {
            namespacer.apply(&mut object).await?;
        }
        let key = ObjectKey::from_object(&object)?;

        self.client.create(&object).await?;
        info!(object = %key, "✅ Created");

        // Pre-existing objects never reach this point, so they are never deleted
        if let Some((stack, cleanup)) = &self.cleanup {
            cleanup.clone().register(stack, object, bindings.clone());
        }

        Ok(bindings)
    }
}
