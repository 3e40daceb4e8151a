use crate::cluster::client::{ClientError, ClusterClient};
use kube::api::DynamicObject;
use std::fmt;
use std::sync::Arc;

/// Scopes objects to a namespace
///
/// Namespaced objects that do not name a namespace get this one; objects
/// that already carry a namespace and cluster-scoped objects are untouched.
#[derive(Clone)]
pub struct Namespacer {
    client: Arc<dyn ClusterClient>,
    namespace: String,
}

impl Namespacer {
    pub fn new(client: Arc<dyn ClusterClient>, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub async fn apply(&self, obj: &mut DynamicObject) -> Result<(), ClientError> {
        if obj.metadata.namespace.as_deref().is_some_and(|ns| !ns.is_empty()) {
            return Ok(());
        }
        let types = obj
            .types
            .as_ref()
            .ok_or_else(|| ClientError::Other("object has no apiVersion/kind".to_string()))?;
        if self.client.is_namespaced(types).await? {
            obj.metadata.namespace = Some(self.namespace.clone());
        }
        Ok(())
    }
}

impl fmt::Debug for Namespacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespacer")
            .field("namespace", &self.namespace)
            .finish()
    }
}
