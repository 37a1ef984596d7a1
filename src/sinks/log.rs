use super::{IncidentBroadcaster, IncidentStore, StatsBroadcaster};
use crate::core::{IncidentEvent, StatsEvent};
use anyhow::Result;
use async_trait::async_trait;

/// Collaborator that only writes to the log. Default when nothing else is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl IncidentStore for LogSink {
    fn persist(&self, incident: &IncidentEvent) -> Result<()> {
        tracing::info!(
            camera_id = %incident.camera_id,
            owner_id = %incident.owner_id,
            kind = %incident.kind,
            severity = %incident.severity,
            confidence = incident.confidence,
            "{}",
            incident.description
        );
        Ok(())
    }
}

#[async_trait]
impl IncidentBroadcaster for LogSink {
    async fn broadcast(&self, incident: IncidentEvent) -> Result<()> {
        tracing::debug!(camera_id = %incident.camera_id, kind = %incident.kind, "incident broadcast");
        Ok(())
    }
}

#[async_trait]
impl StatsBroadcaster for LogSink {
    async fn broadcast_stats(&self, stats: StatsEvent) -> Result<()> {
        tracing::trace!(
            camera_id = %stats.camera_id,
            score = stats.smoothed_score,
            confirmed = stats.confirmed,
            "stats"
        );
        Ok(())
    }
}
