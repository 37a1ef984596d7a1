use crate::core::Attribution;
use crate::error::SentinelError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Temporal confirmation parameters for the escalation monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// EMA weight of the newest target score
    pub smoothing: f64,
    /// Smoothed score must be strictly above this to count as anomalous
    pub threshold: f64,
    pub confirmation_secs: f64,
    pub cooldown_secs: f64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.3,
            threshold: 0.5,
            confirmation_secs: 2.0,
            cooldown_secs: 10.0,
        }
    }
}

impl EscalationConfig {
    pub fn confirmation_window(&self) -> Duration {
        secs_to_duration(self.confirmation_secs)
    }

    pub fn cooldown(&self) -> Duration {
        secs_to_duration(self.cooldown_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoiteringConfig {
    pub duration_secs: f64,
    pub movement_px: f32,
}

impl Default for LoiteringConfig {
    fn default() -> Self {
        Self {
            duration_secs: 10.0,
            movement_px: 50.0,
        }
    }
}

impl LoiteringConfig {
    pub fn duration(&self) -> Duration {
        secs_to_duration(self.duration_secs)
    }
}

/// Saturating conversion for windows that bypassed validation: negative or
/// NaN becomes zero, overflow becomes `Duration::MAX`.
fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

fn check_window(name: &str, secs: f64) -> std::result::Result<(), SentinelError> {
    Duration::try_from_secs_f64(secs).map(|_| ()).map_err(|_| {
        SentinelError::config(format!(
            "{} must be a finite, non-negative number of seconds, got {}",
            name, secs
        ))
    })
}

/// Per-camera loop tuning shared by every pipeline the kernel starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tick_interval_ms: u64,
    pub reconnect_backoff_ms: u64,
    pub frame_queue_capacity: usize,
    pub jpeg_quality: u8,
    pub escalation: EscalationConfig,
    pub loitering: LoiteringConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            reconnect_backoff_ms: 500,
            frame_queue_capacity: 10,
            jpeg_quality: 80,
            escalation: EscalationConfig::default(),
            loitering: LoiteringConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }

    pub fn validate(&self) -> std::result::Result<(), SentinelError> {
        if self.tick_interval_ms == 0 {
            return Err(SentinelError::config("tick_interval_ms must be > 0"));
        }
        if self.frame_queue_capacity == 0 {
            return Err(SentinelError::config("frame_queue_capacity must be > 0"));
        }
        let esc = &self.escalation;
        if !(esc.smoothing > 0.0 && esc.smoothing <= 1.0) {
            return Err(SentinelError::config(format!(
                "escalation.smoothing must be in (0, 1], got {}",
                esc.smoothing
            )));
        }
        if !(0.0..1.0).contains(&esc.threshold) {
            return Err(SentinelError::config(format!(
                "escalation.threshold must be in [0, 1), got {}",
                esc.threshold
            )));
        }
        check_window("escalation.confirmation_secs", esc.confirmation_secs)?;
        check_window("escalation.cooldown_secs", esc.cooldown_secs)?;
        let loit = &self.loitering;
        check_window("loitering.duration_secs", loit.duration_secs)?;
        if !(loit.movement_px.is_finite() && loit.movement_px >= 0.0) {
            return Err(SentinelError::config(format!(
                "loitering.movement_px must be finite and non-negative, got {}",
                loit.movement_px
            )));
        }
        Ok(())
    }
}

/// Start-time configuration of one camera feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Device or URI, resolved through the source registry
    pub source: String,
    pub camera_id: String,
    #[serde(default = "default_owner")]
    pub owner_id: String,
}

fn default_owner() -> String {
    "admin".to_string()
}

impl CameraConfig {
    pub fn new(
        source: impl Into<String>,
        camera_id: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            camera_id: camera_id.into(),
            owner_id: owner_id.into(),
        }
    }

    pub fn attribution(&self) -> Attribution {
        Attribution::new(self.camera_id.clone(), self.owner_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelConfig {
    pub cameras: Vec<CameraConfig>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl SentinelConfig {
    pub fn from_json(config: Value) -> Result<Self> {
        let config: Self =
            serde_json::from_value(config).context("Failed to parse sentinel config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Config file {} is not valid JSON", path.display()))?;
        Self::from_json(value)
    }

    pub fn validate(&self) -> std::result::Result<(), SentinelError> {
        let mut seen = std::collections::HashSet::new();
        for camera in &self.cameras {
            if camera.camera_id.is_empty() {
                return Err(SentinelError::config("camera_id must not be empty"));
            }
            if !seen.insert(camera.camera_id.as_str()) {
                return Err(SentinelError::config(format!(
                    "duplicate camera_id {}",
                    camera.camera_id
                )));
            }
        }
        self.pipeline.validate()
    }
}
