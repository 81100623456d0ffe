//! Prometheus metrics reported by the watchdog.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

/// Histogram buckets for monitoring cycle duration, in seconds.
const DURATION_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0];

/// Process-wide watchdog metrics, created once at startup and registered on
/// the registry served by the `/metrics` endpoint. Counters are monotonic
/// and safe to update concurrently.
pub struct WatchdogMetrics {
    /// Pods terminated (or counted as terminated in dry-run mode).
    pub pods_terminated_total: IntCounterVec,

    /// Pods examined across all namespaces and cycles.
    pub pods_examined_total: IntCounter,

    /// Pods actually terminated due to age limits, per namespace.
    pub pods_terminated_by_age_total: IntCounterVec,

    /// Duration of monitoring cycles.
    pub monitoring_duration_seconds: Histogram,
}

impl WatchdogMetrics {
    /// Create and register the watchdog metrics.
    pub fn new(registry: &Registry) -> Self {
        let pods_terminated_total = IntCounterVec::new(
            Opts::new(
                "pods_terminated_total",
                "Total number of pods terminated by the watchdog",
            ),
            &["namespace", "dry_run"],
        )
        .expect("Failed to create pods_terminated_total metric");
        registry
            .register(Box::new(pods_terminated_total.clone()))
            .expect("Failed to register pods_terminated_total");

        let pods_examined_total = IntCounter::new(
            "pods_examined_total",
            "Total number of pods examined by the watchdog",
        )
        .expect("Failed to create pods_examined_total metric");
        registry
            .register(Box::new(pods_examined_total.clone()))
            .expect("Failed to register pods_examined_total");

        let pods_terminated_by_age_total = IntCounterVec::new(
            Opts::new(
                "pods_terminated_by_age_total",
                "Total number of pods terminated due to age limits",
            ),
            &["namespace"],
        )
        .expect("Failed to create pods_terminated_by_age_total metric");
        registry
            .register(Box::new(pods_terminated_by_age_total.clone()))
            .expect("Failed to register pods_terminated_by_age_total");

        let monitoring_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "monitoring_duration_seconds",
                "Time spent running monitoring checks",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
        )
        .expect("Failed to create monitoring_duration_seconds metric");
        registry
            .register(Box::new(monitoring_duration_seconds.clone()))
            .expect("Failed to register monitoring_duration_seconds");

        Self {
            pods_terminated_total,
            pods_examined_total,
            pods_terminated_by_age_total,
            monitoring_duration_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_metrics() {
        let registry = Registry::new();
        let metrics = WatchdogMetrics::new(&registry);

        metrics
            .pods_terminated_total
            .with_label_values(&["default", "false"])
            .inc();
        metrics.pods_examined_total.inc_by(3);
        metrics
            .pods_terminated_by_age_total
            .with_label_values(&["default"])
            .inc();
        metrics.monitoring_duration_seconds.observe(0.25);

        let families = registry.gather();
        let names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
        assert!(names.contains(&"pods_terminated_total"));
        assert!(names.contains(&"pods_examined_total"));
        assert!(names.contains(&"pods_terminated_by_age_total"));
        assert!(names.contains(&"monitoring_duration_seconds"));
    }

    #[test]
    fn histogram_uses_fixed_buckets() {
        let registry = Registry::new();
        let metrics = WatchdogMetrics::new(&registry);
        metrics.monitoring_duration_seconds.observe(0.05);

        let families = registry.gather();
        let histogram = families
            .iter()
            .find(|f| f.get_name() == "monitoring_duration_seconds")
            .unwrap();
        let buckets = histogram.get_metric()[0].get_histogram().get_bucket();
        let bounds: Vec<f64> = buckets.iter().map(|b| b.get_upper_bound()).collect();
        assert_eq!(bounds, DURATION_BUCKETS.to_vec());
    }
}
