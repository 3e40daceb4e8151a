//! Namespace provisioning
//!
//! Get-or-create: an existing namespace is reused as is. Only a genuine
//! absence leads to creation, and the deletion is deferred before the create
//! call so a half-created namespace is still torn down.

use crate::cluster::{ClientError, ClusterClient, Namespacer, ObjectKey, ResolvedCluster};
use crate::error::RunnerError;
use crate::operations::{CleanupStack, DeleteCleanup};
use common::{template, Bindings, NAMESPACE_BINDING};
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct NamespaceProvisioner {
    cluster: ResolvedCluster,
    client: Arc<dyn ClusterClient>,
    skip_delete: bool,
    cleanup_timeout: Duration,
}

fn namespace_error(namespace: &str, message: impl ToString) -> RunnerError {
    RunnerError::Namespace {
        namespace: namespace.to_string(),
        message: message.to_string(),
    }
}

impl NamespaceProvisioner {
    pub fn new(
        cluster: ResolvedCluster,
        client: Arc<dyn ClusterClient>,
        skip_delete: bool,
        cleanup_timeout: Duration,
    ) -> Self {
        Self {
            cluster,
            client,
            skip_delete,
            cleanup_timeout,
        }
    }

    /// Build the namespace object, merging `template` (resolved against
    /// `bindings`) over the bare namespace
    fn build(
        name: &str,
        template: Option<&Value>,
        bindings: &Bindings,
    ) -> Result<(String, DynamicObject), RunnerError> {
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..ObjectMeta::default()
            },
            ..Namespace::default()
        };
        let mut object = serde_json::to_value(&namespace).map_err(|e| namespace_error(name, e))?;

        if let Some(template) = template {
            let overlay = template::convert_value(template, bindings)?;
            object = template::merge(&object, &overlay);
        }

        let merged_name = object
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| namespace_error(name, "template removed the namespace name"))?
            .to_string();
        let object = serde_json::from_value(object).map_err(|e| namespace_error(name, e))?;
        Ok((merged_name, object))
    }

    /// Make sure namespace `name` exists
    ///
    /// An empty name provisions nothing. Otherwise the `namespace` binding is
    /// registered and a namespacer for it returned. When the namespace is
    /// created here, its deletion is deferred onto `cleanups` unless deletion
    /// is skipped.
    pub async fn provision(
        &self,
        name: &str,
        template: Option<&Value>,
        cleanups: &CleanupStack,
        bindings: Bindings,
    ) -> Result<(Bindings, Option<Namespacer>), RunnerError> {
        if name.is_empty() {
            return Ok((bindings, None));
        }

        let bindings = bindings.register(NAMESPACE_BINDING, json!(name));
        let (name, object) = Self::build(name, template, &bindings)?;
        let bindings = bindings.register(NAMESPACE_BINDING, json!(name));
        let namespacer = Namespacer::new(self.client.clone(), name.clone());
        let key = ObjectKey::from_object(&object)?;

        match self.client.get(&key).await {
            Ok(_) => debug!(namespace = %name, "Namespace exists, reusing it"),
            Err(ClientError::NotFound(_)) => {
                if !self.skip_delete {
                    DeleteCleanup {
                        cluster: self.cluster.clone(),
                        client: self.client.clone(),
                        namespacer: Some(namespacer.clone()),
                        wait: false,
                        timeout: self.cleanup_timeout,
                        report: None,
                    }
                    .register(cleanups, object.clone(), bindings.clone());
                }
                self.client
                    .create(&object)
                    .await
                    .map_err(|e| namespace_error(&name, e))?;
                info!(namespace = %name, "📦 Namespace created");
            }
            Err(e) => return Err(namespace_error(&name, e)),
        }

        Ok((bindings, Some(namespacer)))
    }
}
