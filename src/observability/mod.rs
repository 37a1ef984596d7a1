pub mod collector;
pub mod metrics;
pub mod monitor;

pub use collector::{MetricsCollector, MetricsSnapshot};
pub use metrics::PipelineMetrics;
pub use monitor::PipelineMonitor;
