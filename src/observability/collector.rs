use super::PipelineMetrics;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub camera_id: String,
    pub ticks: u64,
    pub frames_scored: u64,
    pub frames_pushed: u64,
    pub frames_dropped: u64,
    pub placeholder_frames: u64,
    pub reconnect_attempts: u64,
    pub scoring_failures: u64,
    pub incidents: u64,
    pub sink_errors: u64,
    pub avg_tick_us: u64,
}

impl MetricsSnapshot {
    fn of(metrics: &PipelineMetrics) -> Self {
        Self {
            camera_id: metrics.camera_id().to_string(),
            ticks: metrics.ticks(),
            frames_scored: metrics.frames_scored(),
            frames_pushed: metrics.frames_pushed(),
            frames_dropped: metrics.frames_dropped(),
            placeholder_frames: metrics.placeholder_frames(),
            reconnect_attempts: metrics.reconnect_attempts(),
            scoring_failures: metrics.scoring_failures(),
            incidents: metrics.incidents(),
            sink_errors: metrics.sink_errors(),
            avg_tick_us: metrics.avg_tick_us(),
        }
    }
}

/// Metrics of every running camera, keyed by the id it was started with
#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: BTreeMap<String, Arc<PipelineMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, metrics: Arc<PipelineMetrics>) {
        self.metrics.insert(key.into(), metrics);
    }

    pub fn snapshot(&self) -> BTreeMap<String, MetricsSnapshot> {
        self.metrics
            .iter()
            .map(|(key, metrics)| (key.clone(), MetricsSnapshot::of(metrics)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<Arc<PipelineMetrics>> {
        self.metrics.get(key).cloned()
    }
}
