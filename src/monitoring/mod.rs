//! Pod monitoring: aging policies, the per-cycle monitor, the periodic
//! scheduler and the metrics they report.

pub mod ager;
pub mod metrics;
pub mod monitor;
pub mod scheduler;

pub use ager::{AgingPolicy, PolicyError};
pub use metrics::WatchdogMetrics;
pub use monitor::PodMonitor;
pub use scheduler::MonitorScheduler;
