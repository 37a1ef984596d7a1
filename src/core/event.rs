use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Who an event is attributed to. Mutable at runtime via the context update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub camera_id: String,
    pub owner_id: String,
}

impl Attribution {
    pub fn new(camera_id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            camera_id: camera_id.into(),
            owner_id: owner_id.into(),
        }
    }
}

impl Default for Attribution {
    fn default() -> Self {
        Self::new("WEB-01", "admin")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentKind {
    #[serde(rename = "Rapid Escalation")]
    RapidEscalation,
    Loitering,
}

impl IncidentKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RapidEscalation => "Rapid Escalation",
            Self::Loitering => "Loitering",
        }
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(name)
    }
}

/// An operator-visible incident. Immutable once built; ownership passes to
/// the collaborators that persist and broadcast it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentEvent {
    #[serde(rename = "type")]
    pub kind: IncidentKind,
    pub severity: Severity,
    pub description: String,
    pub summary: String,
    pub camera_id: String,
    pub owner_id: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
}

impl IncidentEvent {
    pub fn new(
        kind: IncidentKind,
        severity: Severity,
        description: impl Into<String>,
        attribution: &Attribution,
        confidence: f64,
    ) -> Self {
        Self {
            kind,
            severity,
            description: description.into(),
            summary: format!(
                "Temporal sentinel analysis: {} confirmed after sustained anomaly detection.",
                kind
            ),
            camera_id: attribution.camera_id.clone(),
            owner_id: attribution.owner_id.clone(),
            timestamp: Utc::now(),
            confidence: round2(confidence),
        }
    }
}

/// Per-tick escalation telemetry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "stats")]
pub struct StatsEvent {
    #[serde(rename = "cam")]
    pub camera_id: String,
    #[serde(rename = "score", serialize_with = "serialize_rounded")]
    pub smoothed_score: f64,
    pub confirmed: bool,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_serializes_display_names() {
        let event = IncidentEvent::new(
            IncidentKind::RapidEscalation,
            Severity::High,
            "test",
            &Attribution::new("CAM-1", "ops"),
            0.8765,
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "Rapid Escalation");
        assert_eq!(json["severity"], "High");
        assert_eq!(json["camera_id"], "CAM-1");
        assert_eq!(json["confidence"], 0.88);
        assert!(json["summary"].as_str().unwrap().contains("Rapid Escalation confirmed"));
    }

    #[test]
    fn test_stats_wire_shape() {
        let stats = StatsEvent {
            camera_id: "CAM-1".to_string(),
            smoothed_score: 0.51234,
            confirmed: true,
        };
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["type"], "stats");
        assert_eq!(json["cam"], "CAM-1");
        assert_eq!(json["score"], 0.51);
        assert_eq!(json["confirmed"], true);
    }
}
