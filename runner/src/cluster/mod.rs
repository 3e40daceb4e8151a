//! Cluster access
//!
//! - client: object get/create/delete and resource mapping (kube-rs)
//! - registry: named/default cluster resolution
//! - namespacer: default namespace for namespaced objects

pub mod client;
pub mod namespacer;
pub mod registry;

pub use client::{ClientError, ClusterClient, KubeClient, ObjectKey, ResourceMapper};
pub use namespacer::Namespacer;
pub use registry::{register_cluster_bindings, KubeRegistry, Registry, ResolvedCluster};
