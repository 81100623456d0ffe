//! Kubernetes pod access.
//!
//! Wraps the cluster API behind the narrow [`PodApi`] trait so the
//! monitoring logic can be exercised against a mock in tests. The real
//! implementation uses a shared `kube::Client`; authentication and
//! connection management are owned by `kube` (in-cluster config first,
//! kubeconfig as fallback).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::warn;

/// Snapshot of the pod fields the watchdog cares about.
///
/// Fetched fresh every cycle; never cached across cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    pub creation_timestamp: DateTime<Utc>,
    pub labels: BTreeMap<String, String>,
}

impl PodSnapshot {
    /// Build a snapshot from an API pod object.
    ///
    /// Returns `None` when the pod is missing a name, namespace or creation
    /// timestamp; such a pod can be neither aged nor deleted by name.
    pub fn from_pod(pod: &Pod) -> Option<Self> {
        let name = pod.metadata.name.clone()?;
        let namespace = pod.metadata.namespace.clone()?;
        let creation_timestamp = pod.metadata.creation_timestamp.as_ref()?.0;
        Some(Self {
            name,
            namespace,
            creation_timestamp,
            labels: pod.metadata.labels.clone().unwrap_or_default(),
        })
    }
}

/// Cluster pod operations used by the monitor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PodApi: Send + Sync {
    /// List pods in a namespace matching a label selector. An empty selector
    /// matches all pods.
    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PodSnapshot>, kube::Error>;

    /// Delete a pod by name.
    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), kube::Error>;
}

/// [`PodApi`] implementation backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubePodApi {
    client: Client,
}

impl KubePodApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PodApi for KubePodApi {
    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PodSnapshot>, kube::Error> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);

        let mut lp = ListParams::default();
        if !label_selector.is_empty() {
            lp = lp.labels(label_selector);
        }

        let pod_list = pods.list(&lp).await?;
        let snapshots = pod_list
            .items
            .iter()
            .filter_map(|pod| {
                let snapshot = PodSnapshot::from_pod(pod);
                if snapshot.is_none() {
                    warn!(
                        namespace = %namespace,
                        pod = %pod.metadata.name.as_deref().unwrap_or("<unnamed>"),
                        "skipping pod with incomplete metadata"
                    );
                }
                snapshot
            })
            .collect();
        Ok(snapshots)
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), kube::Error> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        pods.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    fn pod_with_meta(meta: ObjectMeta) -> Pod {
        Pod {
            metadata: meta,
            ..Pod::default()
        }
    }

    #[test]
    fn snapshot_from_complete_pod() {
        let created = Utc::now();
        let pod = pod_with_meta(ObjectMeta {
            name: Some("worker-1".to_string()),
            namespace: Some("batch".to_string()),
            creation_timestamp: Some(Time(created)),
            labels: Some(BTreeMap::from([(
                "app".to_string(),
                "worker".to_string(),
            )])),
            ..ObjectMeta::default()
        });

        let snapshot = PodSnapshot::from_pod(&pod).unwrap();
        assert_eq!(snapshot.name, "worker-1");
        assert_eq!(snapshot.namespace, "batch");
        assert_eq!(snapshot.creation_timestamp, created);
        assert_eq!(snapshot.labels.get("app"), Some(&"worker".to_string()));
    }

    #[test]
    fn snapshot_requires_creation_timestamp() {
        let pod = pod_with_meta(ObjectMeta {
            name: Some("worker-1".to_string()),
            namespace: Some("batch".to_string()),
            creation_timestamp: None,
            ..ObjectMeta::default()
        });
        assert!(PodSnapshot::from_pod(&pod).is_none());
    }

    #[test]
    fn snapshot_requires_name() {
        let pod = pod_with_meta(ObjectMeta {
            name: None,
            namespace: Some("batch".to_string()),
            creation_timestamp: Some(Time(Utc::now())),
            ..ObjectMeta::default()
        });
        assert!(PodSnapshot::from_pod(&pod).is_none());
    }

    #[test]
    fn snapshot_defaults_missing_labels() {
        let pod = pod_with_meta(ObjectMeta {
            name: Some("worker-1".to_string()),
            namespace: Some("batch".to_string()),
            creation_timestamp: Some(Time(Utc::now())),
            labels: None,
            ..ObjectMeta::default()
        });
        let snapshot = PodSnapshot::from_pod(&pod).unwrap();
        assert!(snapshot.labels.is_empty());
    }
}
