use super::identity::{IouIdentity, TrackIdentity};
use crate::config::LoiteringConfig;
use crate::core::{Attribution, BBox, Detection, IncidentEvent, IncidentKind, Severity};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

/// Track identifier. Ids from an external tracker and ids assigned by the
/// store's `TrackIdentity` live in separate spaces, so equal numbers from
/// the two sources never merge two subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKey {
    External(u64),
    Assigned(u64),
}

impl From<u64> for TrackKey {
    fn from(id: u64) -> Self {
        TrackKey::External(id)
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKey::External(id) => write!(f, "{}", id),
            TrackKey::Assigned(id) => write!(f, "auto-{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub timestamp: Instant,
    pub center_x: f32,
    pub center_y: f32,
}

/// Position history of one subject; timestamps never decrease
#[derive(Debug, Clone)]
pub struct Track {
    pub key: TrackKey,
    pub history: Vec<TrackPoint>,
}

impl Track {
    fn new(key: TrackKey) -> Self {
        Self {
            key,
            history: Vec::new(),
        }
    }

    fn push(&mut self, timestamp: Instant, center_x: f32, center_y: f32) {
        let timestamp = match self.history.last() {
            Some(last) if timestamp < last.timestamp => last.timestamp,
            _ => timestamp,
        };
        self.history.push(TrackPoint {
            timestamp,
            center_x,
            center_y,
        });
    }

    /// Span from first to last point; `None` with fewer than two points
    pub fn duration(&self) -> Option<Duration> {
        match (self.history.first(), self.history.last()) {
            (Some(first), Some(last)) if self.history.len() >= 2 => {
                Some(last.timestamp.saturating_duration_since(first.timestamp))
            }
            _ => None,
        }
    }

    /// Euclidean distance between first and last centers
    pub fn displacement(&self) -> Option<f32> {
        match (self.history.first(), self.history.last()) {
            (Some(first), Some(last)) if self.history.len() >= 2 => {
                let dx = last.center_x - first.center_x;
                let dy = last.center_y - first.center_y;
                Some((dx * dx + dy * dy).sqrt())
            }
            _ => None,
        }
    }
}

/// Per-subject history and loitering evaluation.
///
/// A track disappears the first frame its id is not observed; there is no
/// grace period, so a single missed detection restarts accumulation.
pub struct TrackStore {
    config: LoiteringConfig,
    identity: Box<dyn TrackIdentity>,
    min_duration: Duration,
    tracks: HashMap<TrackKey, Track>,
}

impl TrackStore {
    pub fn new(config: LoiteringConfig) -> Self {
        Self::with_identity(config, Box::new(IouIdentity::default()))
    }

    pub fn with_identity(config: LoiteringConfig, identity: Box<dyn TrackIdentity>) -> Self {
        Self {
            min_duration: config.duration(),
            config,
            identity,
            tracks: HashMap::new(),
        }
    }

    /// Bare `u64` lookups address externally supplied ids
    pub fn track(&self, key: impl Into<TrackKey>) -> Option<&Track> {
        self.tracks.get(&key.into())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn observe(
        &mut self,
        detections: &[Detection],
        timestamp: Instant,
        attribution: &Attribution,
    ) -> Vec<IncidentEvent> {
        let persons: Vec<&Detection> = detections.iter().filter(|d| d.is_person()).collect();

        // Only ask the identity provider about boxes without an external id
        let unlabeled: Vec<BBox> = persons
            .iter()
            .filter(|d| d.track_id.is_none())
            .map(|d| d.bbox)
            .collect();
        let mut assigned = self.identity.assign(&unlabeled).into_iter();

        let mut seen = HashSet::new();
        let mut updated = Vec::new();
        for det in persons {
            let key = match det.track_id {
                Some(id) => TrackKey::External(id),
                None => match assigned.next() {
                    Some(id) => TrackKey::Assigned(id),
                    None => continue,
                },
            };
            self.tracks
                .entry(key)
                .or_insert_with(|| Track::new(key))
                .push(timestamp, det.bbox.center_x(), det.bbox.center_y());
            if seen.insert(key) {
                updated.push(key);
            }
        }

        let incidents = updated
            .into_iter()
            .filter(|key| self.is_loitering(*key))
            .map(|key| {
                tracing::info!(camera_id = %attribution.camera_id, track = %key, "loitering detected");
                IncidentEvent::new(
                    IncidentKind::Loitering,
                    Severity::Medium,
                    format!(
                        "Person (ID: {}) detected in zone for over {}s.",
                        key, self.config.duration_secs
                    ),
                    attribution,
                    1.0,
                )
            })
            .collect();

        self.tracks.retain(|id, _| seen.contains(id));

        incidents
    }

    pub fn is_loitering(&self, key: impl Into<TrackKey>) -> bool {
        let Some(track) = self.tracks.get(&key.into()) else {
            return false;
        };
        match (track.duration(), track.displacement()) {
            (Some(duration), Some(distance)) => {
                duration > self.min_duration && distance < self.config.movement_px
            }
            _ => false,
        }
    }
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new(LoiteringConfig::default())
    }
}
