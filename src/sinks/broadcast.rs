use super::{IncidentBroadcaster, StatsBroadcaster};
use crate::core::{IncidentEvent, StatsEvent};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

/// What live subscribers receive
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiveMessage {
    Incident(IncidentEvent),
    Stats(StatsEvent),
}

/// In-process fan-out to any number of live subscribers.
///
/// Sending never waits: with no subscribers the message is discarded, and a
/// subscriber that falls behind the ring loses the oldest messages.
#[derive(Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<LiveMessage>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveMessage> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn publish(&self, message: LiveMessage) {
        // Err only means nobody is listening
        let _ = self.tx.send(message);
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl IncidentBroadcaster for BroadcastHub {
    async fn broadcast(&self, incident: IncidentEvent) -> Result<()> {
        self.publish(LiveMessage::Incident(incident));
        Ok(())
    }
}

#[async_trait]
impl StatsBroadcaster for BroadcastHub {
    async fn broadcast_stats(&self, stats: StatsEvent) -> Result<()> {
        self.publish(LiveMessage::Stats(stats));
        Ok(())
    }
}
