//! Cluster client
//!
//! Narrow get/create/delete surface over dynamic objects. Errors distinguish
//! "not found" from everything else; callers rely on that to pick the create
//! branch during idempotent provisioning.

use async_trait::async_trait;
use common::ResourceReference;
use kube::api::{
    Api, ApiResource, DeleteParams, DynamicObject, GroupVersionKind, PostParams,
    PropagationPolicy, TypeMeta,
};
use kube::discovery::{pinned_kind, ApiCapabilities, Discovery, Scope};
use kube::Client;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Cluster client errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

impl From<kube::Error> for ClientError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 404 => ClientError::NotFound(ae.message),
            other => ClientError::Other(other.to_string()),
        }
    }
}

/// Identifies a single object in a cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    /// Derive the key of an object; type information and a name are required
    pub fn from_object(obj: &DynamicObject) -> Result<Self, ClientError> {
        let types = obj
            .types
            .as_ref()
            .ok_or_else(|| ClientError::Other("object has no apiVersion/kind".to_string()))?;
        let name = obj
            .metadata
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ClientError::Other(format!("{} has no name", types.kind)))?;
        Ok(Self {
            api_version: types.api_version.clone(),
            kind: types.kind.clone(),
            namespace: obj.metadata.namespace.clone().filter(|n| !n.is_empty()),
            name,
        })
    }

    pub fn type_meta(&self) -> TypeMeta {
        TypeMeta {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{} {}/{}", self.api_version, self.kind, ns, self.name),
            None => write!(f, "{}/{} {}", self.api_version, self.kind, self.name),
        }
    }
}

/// Object operations against one cluster
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn get(&self, key: &ObjectKey) -> Result<DynamicObject, ClientError>;

    async fn create(&self, obj: &DynamicObject) -> Result<DynamicObject, ClientError>;

    async fn delete(
        &self,
        obj: &DynamicObject,
        propagation: PropagationPolicy,
    ) -> Result<(), ClientError>;

    /// Whether objects of this type live in a namespace
    async fn is_namespaced(&self, types: &TypeMeta) -> Result<bool, ClientError>;
}

/// Maps a resource reference to the name `kubectl` understands and its scope
#[async_trait]
pub trait ResourceMapper: Send + Sync {
    /// Returns `(resource, cluster_scoped)`, e.g. `("deployments.apps", false)`
    async fn map_resource(
        &self,
        reference: &ResourceReference,
    ) -> Result<(String, bool), ClientError>;
}

/// Split `group/version` (core group has no slash)
pub fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.rsplit_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

fn resource_name(ar: &ApiResource) -> String {
    if ar.group.is_empty() {
        ar.plural.clone()
    } else {
        format!("{}.{}", ar.plural, ar.group)
    }
}

/// kube-rs backed client using API discovery for type mapping
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn discover(&self, types: &TypeMeta) -> Result<(ApiResource, ApiCapabilities), ClientError> {
        let (group, version) = split_api_version(&types.api_version);
        let gvk = GroupVersionKind::gvk(group, version, &types.kind);
        Ok(pinned_kind(&self.client, &gvk).await?)
    }

    async fn api(&self, key: &ObjectKey) -> Result<Api<DynamicObject>, ClientError> {
        let (ar, caps) = self.discover(&key.type_meta()).await?;
        let api = match (caps.scope, key.namespace.as_deref()) {
            (Scope::Cluster, _) => Api::all_with(self.client.clone(), &ar),
            (Scope::Namespaced, Some(ns)) => Api::namespaced_with(self.client.clone(), ns, &ar),
            (Scope::Namespaced, None) => Api::default_namespaced_with(self.client.clone(), &ar),
        };
        Ok(api)
    }
}

#[async_trait]
impl ClusterClient for KubeClient {
    async fn get(&self, key: &ObjectKey) -> Result<DynamicObject, ClientError> {
        let api = self.api(key).await?;
        Ok(api.get(&key.name).await?)
    }

    async fn create(&self, obj: &DynamicObject) -> Result<DynamicObject, ClientError> {
        let key = ObjectKey::from_object(obj)?;
        let api = self.api(&key).await?;
        let created = api.create(&PostParams::default(), obj).await?;
        debug!(object = %key, "Created object");
        Ok(created)
    }

    async fn delete(
        &self,
        obj: &DynamicObject,
        propagation: PropagationPolicy,
    ) -> Result<(), ClientError> {
        let key = ObjectKey::from_object(obj)?;
        let api = self.api(&key).await?;
        let params = DeleteParams {
            propagation_policy: Some(propagation),
            ..DeleteParams::default()
        };
        api.delete(&key.name, &params).await?;
        debug!(object = %key, "Deleted object");
        Ok(())
    }

    async fn is_namespaced(&self, types: &TypeMeta) -> Result<bool, ClientError> {
        let (_, caps) = self.discover(types).await?;
        Ok(matches!(caps.scope, Scope::Namespaced))
    }
}

#[async_trait]
impl ResourceMapper for KubeClient {
    async fn map_resource(
        &self,
        reference: &ResourceReference,
    ) -> Result<(String, bool), ClientError> {
        if reference.resource.is_empty() {
            let types = TypeMeta {
                api_version: reference.api_version.clone(),
                kind: reference.kind.clone(),
            };
            let (ar, caps) = self.discover(&types).await?;
            return Ok((resource_name(&ar), matches!(caps.scope, Scope::Cluster)));
        }

        // Bare resource names ("pods", "deployments.apps") need a full discovery pass
        let discovery = Discovery::new(self.client.clone()).run().await?;
        for group in discovery.groups() {
            for (ar, caps) in group.recommended_resources() {
                if ar.plural == reference.resource || resource_name(&ar) == reference.resource {
                    return Ok((resource_name(&ar), matches!(caps.scope, Scope::Cluster)));
                }
            }
        }
        Err(ClientError::NotFound(format!(
            "resource type {}",
            reference.resource
        )))
    }
}
