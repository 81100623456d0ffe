//! Aging policies.
//!
//! A policy decides whether a pod is too old. Exactly one policy variant is
//! active for an entire monitoring cycle, resolved once from the config at
//! cycle start.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::config::WatchdogConfig;
use crate::kubernetes::PodSnapshot;

/// Policy evaluation failures.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid TTL label value '{value}' on pod '{pod}': {source}")]
    InvalidTtlValue {
        pod: String,
        value: String,
        source: std::num::ParseFloatError,
    },
}

/// Decides whether a pod has exceeded its allowed lifetime.
#[derive(Debug)]
pub enum AgingPolicy {
    Creation(CreationPolicy),
    Labeled(LabeledPolicy),
}

impl AgingPolicy {
    /// Resolve the active policy from configuration: an empty TTL label
    /// selects the creation-age policy, anything else the labeled policy.
    pub fn from_config(config: &WatchdogConfig) -> Self {
        if config.ttl_label.is_empty() {
            Self::Creation(CreationPolicy::new(config.max_pod_lifetime()))
        } else {
            Self::Labeled(LabeledPolicy::new(
                config.ttl_label.clone(),
                config.max_pod_lifetime(),
            ))
        }
    }

    /// Returns whether the pod is too old as of `now`.
    pub fn is_old(&self, pod: &PodSnapshot, now: DateTime<Utc>) -> Result<bool, PolicyError> {
        match self {
            Self::Creation(policy) => Ok(policy.is_old(pod, now)),
            Self::Labeled(policy) => policy.is_old(pod, now),
        }
    }
}

/// Ages pods purely by their creation timestamp. Total; never fails.
#[derive(Debug)]
pub struct CreationPolicy {
    max_lifetime: Duration,
}

impl CreationPolicy {
    pub fn new(max_lifetime: Duration) -> Self {
        Self { max_lifetime }
    }

    pub fn is_old(&self, pod: &PodSnapshot, now: DateTime<Utc>) -> bool {
        let age = now - pod.creation_timestamp;
        tracing::debug!(
            pod = %pod.name,
            namespace = %pod.namespace,
            age_secs = age.num_seconds(),
            max_secs = self.max_lifetime.num_seconds(),
            "evaluated pod age"
        );
        age > self.max_lifetime
    }
}

/// Ages pods by an explicit expiry timestamp carried in a label, with the
/// creation-age rule as a safety net for workloads that omit the label or
/// set it incorrectly.
#[derive(Debug)]
pub struct LabeledPolicy {
    ttl_key: String,
    creation: CreationPolicy,
}

impl LabeledPolicy {
    pub fn new(ttl_key: String, max_lifetime: Duration) -> Self {
        Self {
            ttl_key,
            creation: CreationPolicy::new(max_lifetime),
        }
    }

    pub fn is_old(&self, pod: &PodSnapshot, now: DateTime<Utc>) -> Result<bool, PolicyError> {
        if self.creation.is_old(pod, now) {
            tracing::warn!(
                pod = %pod.name,
                namespace = %pod.namespace,
                "pod exceeds maximum lifetime by creation time"
            );
            return Ok(true);
        }

        let Some(raw) = pod.labels.get(&self.ttl_key) else {
            tracing::warn!(
                pod = %pod.name,
                namespace = %pod.namespace,
                label = %self.ttl_key,
                "no TTL label on pod"
            );
            return Ok(false);
        };

        let kill_time: f64 = raw.parse().map_err(|source| PolicyError::InvalidTtlValue {
            pod: pod.name.clone(),
            value: raw.clone(),
            source,
        })?;

        let now_unix = now.timestamp() as f64;
        if kill_time <= now_unix {
            tracing::info!(
                pod = %pod.name,
                namespace = %pod.namespace,
                kill_time,
                "pod expired by TTL label"
            );
            return Ok(true);
        }
        Ok(false)
    }
}
