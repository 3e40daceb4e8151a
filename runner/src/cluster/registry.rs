//! Cluster registry
//!
//! Resolves a named (or the default) cluster to its configuration and client.
//! Clients are built on first use and cached for the rest of the run; a slow
//! connection to one cluster never holds up resolving another.

use crate::cluster::client::{ClusterClient, KubeClient, ResourceMapper};
use crate::config::ClusterConfig;
use crate::error::RunnerError;
use async_trait::async_trait;
use common::{Bindings, CLUSTER_BINDING};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::info;

/// A resolved cluster; `name` is empty for the default cluster
#[derive(Clone)]
pub struct ResolvedCluster {
    pub name: String,
    pub config: Option<ClusterConfig>,
    pub client: Option<Arc<dyn ClusterClient>>,
    pub mapper: Option<Arc<dyn ResourceMapper>>,
}

impl ResolvedCluster {
    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }
}

/// Resolves clusters by name
#[async_trait]
pub trait Registry: Send + Sync {
    /// Resolve `name`, or the default cluster when no name is given and
    /// `require_explicit` is false
    async fn resolve(
        &self,
        require_explicit: bool,
        name: Option<&str>,
    ) -> Result<ResolvedCluster, RunnerError>;
}

/// Register the `cluster` binding describing `cluster`
pub fn register_cluster_bindings(bindings: &Bindings, cluster: &ResolvedCluster) -> Bindings {
    let config = cluster.config.clone().unwrap_or_default();
    bindings.register(
        CLUSTER_BINDING,
        json!({
            "name": cluster.name,
            "context": config.context,
            "kubeconfig": config.kubeconfig,
        }),
    )
}

/// Connect-once cache keyed by cluster name
///
/// The map lock is only held to look up a name's cell. Concurrent callers
/// for the same name share one connection attempt; a failed attempt leaves
/// the cell empty so the next caller retries.
struct ClientCache<T> {
    cells: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
}

impl<T: Clone> ClientCache<T> {
    fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    fn cell(&self, name: &str) -> Arc<OnceCell<T>> {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    async fn get_or_connect<F, Fut>(&self, name: &str, connect: F) -> Result<T, RunnerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RunnerError>>,
    {
        let cell = self.cell(name);
        let client = cell.get_or_try_init(connect).await?;
        Ok(client.clone())
    }
}

/// Registry backed by kubeconfig files
pub struct KubeRegistry {
    clusters: BTreeMap<String, ClusterConfig>,
    clients: ClientCache<KubeClient>,
}

impl KubeRegistry {
    pub fn new(clusters: BTreeMap<String, ClusterConfig>) -> Self {
        Self {
            clusters,
            clients: ClientCache::new(),
        }
    }

    async fn connect(name: &str, config: Option<&ClusterConfig>) -> Result<KubeClient, RunnerError> {
        let cluster_err = |e: &dyn std::fmt::Display| {
            RunnerError::Cluster(format!("failed to connect to cluster '{}': {}", name, e))
        };

        let client = match config {
            None => Client::try_default().await.map_err(|e| cluster_err(&e))?,
            Some(config) => {
                let kubeconfig = match &config.kubeconfig {
                    Some(path) => Kubeconfig::read_from(path).map_err(|e| cluster_err(&e))?,
                    None => Kubeconfig::read().map_err(|e| cluster_err(&e))?,
                };
                let options = KubeConfigOptions {
                    context: config.context.clone(),
                    ..Default::default()
                };
                let config = Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| cluster_err(&e))?;
                Client::try_from(config).map_err(|e| cluster_err(&e))?
            }
        };

        info!(cluster = %name, "Connected to cluster");
        Ok(KubeClient::new(client))
    }
}

#[async_trait]
impl Registry for KubeRegistry {
    async fn resolve(
        &self,
        require_explicit: bool,
        name: Option<&str>,
    ) -> Result<ResolvedCluster, RunnerError> {
        let name = match name.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None if require_explicit => {
                return Err(RunnerError::Cluster("a cluster name is required".to_string()))
            }
            None => "",
        };

        let config = if name.is_empty() {
            None
        } else {
            Some(
                self.clusters
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RunnerError::Cluster(format!("cluster not found: {}", name)))?,
            )
        };

        let display = if name.is_empty() { "default" } else { name };
        let client = self
            .clients
            .get_or_connect(name, || Self::connect(display, config.as_ref()))
            .await?;

        let client = Arc::new(client);
        Ok(ResolvedCluster {
            name: name.to_string(),
            config,
            client: Some(client.clone()),
            mapper: Some(client),
        })
    }
}
