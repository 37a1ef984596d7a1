use crate::core::{IncidentEvent, StatsEvent};
use crate::observability::PipelineMetrics;
use crate::sinks::{IncidentBroadcaster, IncidentStore, LogSink, StatsBroadcaster};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Upper bound on stats broadcasts still running; further ticks skip theirs
const MAX_STATS_IN_FLIGHT: usize = 32;

/// Hands events to the collaborators without letting them stall or abort a tick.
///
/// Persistence runs inline since stores are expected to be quick, but errors and
/// panics are contained. Broadcasts are spawned onto the runtime and never
/// awaited. Every failure is logged and counted, never retried.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn IncidentStore>,
    incidents: Arc<dyn IncidentBroadcaster>,
    stats: Arc<dyn StatsBroadcaster>,
    metrics: Arc<PipelineMetrics>,
    stats_permits: Arc<Semaphore>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Log-only collaborators until replaced with the `with_*` methods
    pub fn new() -> Self {
        Self {
            store: Arc::new(LogSink),
            incidents: Arc::new(LogSink),
            stats: Arc::new(LogSink),
            metrics: Arc::new(PipelineMetrics::new("unbound")),
            stats_permits: Arc::new(Semaphore::new(MAX_STATS_IN_FLIGHT)),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn IncidentStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_incident_broadcaster(mut self, broadcaster: Arc<dyn IncidentBroadcaster>) -> Self {
        self.incidents = broadcaster;
        self
    }

    pub fn with_stats_broadcaster(mut self, broadcaster: Arc<dyn StatsBroadcaster>) -> Self {
        self.stats = broadcaster;
        self
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Count failures against one camera's metrics. Each pipeline binds its own
    /// and gets a private cap on in-flight stats broadcasts.
    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = metrics;
        self.stats_permits = Arc::new(Semaphore::new(MAX_STATS_IN_FLIGHT));
        self
    }

    pub fn incident(&self, incident: IncidentEvent) {
        self.metrics.record_incident();

        let persisted = catch_unwind(AssertUnwindSafe(|| self.store.persist(&incident)));
        match persisted {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(error = %e, camera_id = %incident.camera_id, "incident persist failed");
                self.metrics.record_sink_error();
            }
            Err(_) => {
                tracing::error!(camera_id = %incident.camera_id, "incident store panicked");
                self.metrics.record_sink_error();
            }
        }

        let broadcaster = self.incidents.clone();
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = broadcaster.broadcast(incident).await {
                tracing::warn!(error = %e, "incident broadcast failed");
                metrics.record_sink_error();
            }
        });
    }

    pub fn stats(&self, stats: StatsEvent) {
        let Ok(permit) = self.stats_permits.clone().try_acquire_owned() else {
            tracing::trace!(camera_id = %stats.camera_id, "stats broadcaster saturated, skipping tick");
            return;
        };

        let broadcaster = self.stats.clone();
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = broadcaster.broadcast_stats(stats).await {
                tracing::debug!(error = %e, "stats broadcast failed");
                metrics.record_sink_error();
            }
        });
    }
}
