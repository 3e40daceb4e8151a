use super::cluster::FakeCluster;
use async_trait::async_trait;
use ketju::cluster::{Registry, ResolvedCluster};
use ketju::config::ClusterConfig;
use ketju::RunnerError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry over in-memory clusters
pub struct FakeRegistry {
    pub default: Arc<FakeCluster>,
    named: BTreeMap<String, Arc<FakeCluster>>,
    unreachable: bool,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self {
            default: Arc::new(FakeCluster::new()),
            named: BTreeMap::new(),
            unreachable: false,
        }
    }

    pub fn with_cluster(mut self, name: &str, cluster: Arc<FakeCluster>) -> Self {
        self.named.insert(name.to_string(), cluster);
        self
    }

    /// Make every resolution fail
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn resolve(
        &self,
        require_explicit: bool,
        name: Option<&str>,
    ) -> Result<ResolvedCluster, RunnerError> {
        if self.unreachable {
            return Err(RunnerError::Cluster("cluster unreachable".to_string()));
        }
        let (name, cluster, config) = match name.filter(|n| !n.is_empty()) {
            Some(name) => {
                let cluster = self
                    .named
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RunnerError::Cluster(format!("cluster not found: {}", name)))?;
                (name.to_string(), cluster, Some(ClusterConfig::default()))
            }
            None if require_explicit => {
                return Err(RunnerError::Cluster("a cluster name is required".to_string()))
            }
            None => (String::new(), self.default.clone(), None),
        };
        Ok(ResolvedCluster {
            name,
            config,
            client: Some(cluster.clone()),
            mapper: Some(cluster),
        })
    }
}
