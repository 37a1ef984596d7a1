//! Temporal confirmation of sustained motion anomalies.
//!
//! The smoothed score must stay above threshold for the whole confirmation
//! window before an incident fires, and consecutive incidents are spaced by
//! at least the cooldown. The confirmation clock is cleared at fire time,
//! not when the cooldown ends: a continuously high score restarts
//! confirming on the very next tick, and emission stays gated by the
//! cooldown alone.

use crate::config::EscalationConfig;
use crate::core::{Attribution, IncidentEvent, IncidentKind, Severity, StatsEvent};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationPhase {
    Idle,
    Confirming,
    /// An alert fired and the cooldown has not elapsed yet
    Cooling,
}

/// Outcome of one tick
#[derive(Debug, Clone)]
pub struct EscalationUpdate {
    pub stats: StatsEvent,
    pub incident: Option<IncidentEvent>,
}

/// One per camera, owned by that camera's pipeline loop
#[derive(Debug, Clone)]
pub struct EscalationMonitor {
    config: EscalationConfig,
    confirmation_window: Duration,
    cooldown: Duration,
    smoothed_score: f64,
    confirmation_start: Option<Instant>,
    last_alert: Option<Instant>,
}

impl EscalationMonitor {
    pub fn new(config: EscalationConfig) -> Self {
        Self {
            confirmation_window: config.confirmation_window(),
            cooldown: config.cooldown(),
            config,
            smoothed_score: 0.0,
            confirmation_start: None,
            last_alert: None,
        }
    }

    pub fn smoothed_score(&self) -> f64 {
        self.smoothed_score
    }

    pub fn confirmation_start(&self) -> Option<Instant> {
        self.confirmation_start
    }

    pub fn last_alert(&self) -> Option<Instant> {
        self.last_alert
    }

    /// Cooldown takes precedence: confirmation may already be re-arming
    /// while emission is still gated.
    pub fn phase(&self, now: Instant) -> EscalationPhase {
        if self.in_cooldown(now) {
            EscalationPhase::Cooling
        } else if self.confirmation_start.is_some() {
            EscalationPhase::Confirming
        } else {
            EscalationPhase::Idle
        }
    }

    /// Confirmation has run for the full window as of `now`
    pub fn is_confirmed(&self, now: Instant) -> bool {
        self.confirmation_start
            .map(|start| elapsed(start, now) >= self.confirmation_window)
            .unwrap_or(false)
    }

    fn in_cooldown(&self, now: Instant) -> bool {
        self.last_alert
            .map(|t| elapsed(t, now) <= self.cooldown)
            .unwrap_or(false)
    }

    /// Feed one target score in [0, 1]. Out-of-range or NaN input is clamped.
    pub fn update(
        &mut self,
        target_score: f64,
        now: Instant,
        attribution: &Attribution,
    ) -> EscalationUpdate {
        let target = if target_score.is_nan() {
            0.0
        } else {
            target_score.clamp(0.0, 1.0)
        };
        let alpha = self.config.smoothing;
        self.smoothed_score = self.smoothed_score * (1.0 - alpha) + target * alpha;

        let mut incident = None;

        if self.smoothed_score > self.config.threshold {
            let start = match self.confirmation_start {
                Some(start) => start,
                None => {
                    tracing::info!(
                        camera_id = %attribution.camera_id,
                        score = self.smoothed_score,
                        "escalation detected, monitoring for persistence"
                    );
                    self.confirmation_start = Some(now);
                    now
                }
            };

            let duration = elapsed(start, now);
            let cooled = self
                .last_alert
                .map(|t| elapsed(t, now) > self.cooldown)
                .unwrap_or(true);

            if duration >= self.confirmation_window && cooled {
                let event = IncidentEvent::new(
                    IncidentKind::RapidEscalation,
                    Severity::High,
                    format!(
                        "Sustained motion anomaly (duration: {:.1}s) detected in secure zone.",
                        duration.as_secs_f64()
                    ),
                    attribution,
                    self.smoothed_score,
                );
                tracing::warn!(
                    camera_id = %attribution.camera_id,
                    duration_secs = duration.as_secs_f64(),
                    score = self.smoothed_score,
                    "rapid escalation confirmed"
                );
                self.last_alert = Some(now);
                self.confirmation_start = None;
                incident = Some(event);
            }
        } else if self.confirmation_start.take().is_some() {
            tracing::info!(
                camera_id = %attribution.camera_id,
                score = self.smoothed_score,
                "escalation subsided, resetting confirmation timer"
            );
        }

        EscalationUpdate {
            stats: StatsEvent {
                camera_id: attribution.camera_id.clone(),
                smoothed_score: self.smoothed_score,
                confirmed: self.is_confirmed(now),
            },
            incident,
        }
    }

    /// Stats for a tick where no score was computed
    pub fn snapshot(&self, now: Instant, attribution: &Attribution) -> StatsEvent {
        StatsEvent {
            camera_id: attribution.camera_id.clone(),
            smoothed_score: self.smoothed_score,
            confirmed: self.is_confirmed(now),
        }
    }
}

impl Default for EscalationMonitor {
    fn default() -> Self {
        Self::new(EscalationConfig::default())
    }
}

fn elapsed(since: Instant, now: Instant) -> Duration {
    now.saturating_duration_since(since)
}
