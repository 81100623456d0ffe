//! Pod lifetime watchdog core library.
//!
//! Enforces a maximum-lifetime policy on pods: on a fixed schedule the
//! watchdog lists pods matching configured namespaces and label selectors,
//! decides per pod whether it is too old, and deletes the ones that are
//! (or only logs them in dry-run mode).

pub mod config;
pub mod kubernetes;
pub mod monitoring;
pub mod server;

pub use config::{Settings, WatchdogConfig};
pub use kubernetes::{KubePodApi, PodApi, PodSnapshot};
pub use monitoring::{AgingPolicy, MonitorScheduler, PodMonitor, WatchdogMetrics};
