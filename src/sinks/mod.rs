//! Collaborator boundary: where incidents and stats leave the core.
//!
//! Persistence is synchronous and expected to be quick. Broadcasts are
//! async and best-effort; the pipeline spawns them and never awaits them
//! on the tick path.

pub mod broadcast;
pub mod jsonl;
pub mod log;

pub use broadcast::{BroadcastHub, LiveMessage};
pub use jsonl::JsonlIncidentStore;
pub use log::LogSink;

use crate::core::{IncidentEvent, StatsEvent};
use anyhow::Result;
use async_trait::async_trait;

pub trait IncidentStore: Send + Sync {
    fn persist(&self, incident: &IncidentEvent) -> Result<()>;
}

#[async_trait]
pub trait IncidentBroadcaster: Send + Sync {
    async fn broadcast(&self, incident: IncidentEvent) -> Result<()>;
}

#[async_trait]
pub trait StatsBroadcaster: Send + Sync {
    async fn broadcast_stats(&self, stats: StatsEvent) -> Result<()>;
}
