//! Per-cycle pod monitoring and termination.

use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::WatchdogConfig;
use crate::kubernetes::PodApi;
use crate::monitoring::ager::AgingPolicy;
use crate::monitoring::metrics::WatchdogMetrics;

/// Runs one monitoring pass: lists pods per namespace, applies the active
/// aging policy and terminates (or logs, in dry-run mode) the pods that
/// exceed it.
///
/// Namespace- and pod-level failures are logged and isolated; they never
/// escalate out of [`PodMonitor::run`].
pub struct PodMonitor {
    api: Arc<dyn PodApi>,
    config: Arc<WatchdogConfig>,
    metrics: Arc<WatchdogMetrics>,
}

impl PodMonitor {
    pub fn new(
        api: Arc<dyn PodApi>,
        config: Arc<WatchdogConfig>,
        metrics: Arc<WatchdogMetrics>,
    ) -> Self {
        Self {
            api,
            config,
            metrics,
        }
    }

    /// Perform one monitoring and cleanup cycle.
    pub async fn run(&self) -> Result<()> {
        info!("starting pod monitoring and cleanup");

        // Records the cycle duration on drop, exactly once per invocation.
        let _timer = self.metrics.monitoring_duration_seconds.start_timer();

        let label_selector = build_label_selector(&self.config.label_selectors);
        let policy = AgingPolicy::from_config(&self.config);
        let now = Utc::now();

        for namespace in &self.config.namespaces {
            debug!(namespace = %namespace, "processing namespace");

            let pods = match self.api.list_pods(namespace, &label_selector).await {
                Ok(pods) => pods,
                Err(err) => {
                    error!(namespace = %namespace, error = %err, "failed to list pods");
                    continue;
                }
            };

            debug!(
                namespace = %namespace,
                count = pods.len(),
                "found pods with matching labels"
            );
            self.metrics.pods_examined_total.inc_by(pods.len() as u64);

            for pod in &pods {
                let is_old = match policy.is_old(pod, now) {
                    Ok(is_old) => is_old,
                    Err(err) => {
                        warn!(
                            pod = %pod.name,
                            namespace = %namespace,
                            error = %err,
                            "unable to evaluate pod age"
                        );
                        continue;
                    }
                };
                if !is_old {
                    continue;
                }

                if self.config.dry_run {
                    info!(pod = %pod.name, namespace = %namespace, "dry run: would terminate pod");
                    self.metrics
                        .pods_terminated_total
                        .with_label_values(&[namespace, "true"])
                        .inc();
                    continue;
                }

                // No in-cycle retry: the next cycle re-lists and re-evaluates.
                match self.api.delete_pod(namespace, &pod.name).await {
                    Ok(()) => {
                        info!(pod = %pod.name, namespace = %namespace, "terminated pod");
                        self.metrics
                            .pods_terminated_total
                            .with_label_values(&[namespace, "false"])
                            .inc();
                        self.metrics
                            .pods_terminated_by_age_total
                            .with_label_values(&[namespace])
                            .inc();
                    }
                    Err(err) => {
                        error!(
                            pod = %pod.name,
                            namespace = %namespace,
                            error = %err,
                            "failed to terminate pod"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

/// Build a label selector string from the configured label map: one
/// `key=value` clause per entry, comma-joined. The map is unordered, so the
/// clause order is unspecified. An empty map yields an empty selector.
pub fn build_label_selector(labels: &HashMap<String, String>) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}
