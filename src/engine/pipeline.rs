use crate::analysis::{Detector, EscalationMonitor, MotionScorer, TrackStore};
use crate::config::{CameraConfig, PipelineConfig};
use crate::core::{encode_jpeg, offline_placeholder, Attribution, EncodedFrame, Frame, IncidentEvent, StatsEvent};
use crate::engine::frame_queue::{frame_queue, FrameQueue, FrameReader};
use crate::engine::state::FeedState;
use crate::error::SentinelError;
use crate::hal::{ManagedSource, OfflineDriver, SourceDriver, SourceRegistry, SourceUri};
use crate::observability::PipelineMetrics;
use crate::resilience::{Dispatcher, ReconnectPolicy};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// What one tick did
#[derive(Debug, Clone)]
pub struct TickOutcome {
    /// A frame (live or placeholder) went into the queue
    pub frame_pushed: bool,
    /// The queue was full and the frame was dropped
    pub frame_dropped: bool,
    /// No live frame this tick; the offline placeholder was offered instead
    pub placeholder: bool,
    /// A motion score was computed against the previous frame
    pub scored: bool,
    pub stats: StatsEvent,
    pub incidents: Vec<IncidentEvent>,
    /// The source failed; wait this long before the next tick
    pub backoff: Option<Duration>,
}

/// Per-camera processing loop.
///
/// Owns the source handle and all analysis state for one feed. Drive it one
/// step at a time with [`CameraPipeline::tick`], or hand it to a task with
/// [`CameraPipeline::spawn`].
pub struct CameraPipeline {
    source: ManagedSource,
    scorer: MotionScorer,
    escalation: EscalationMonitor,
    tracks: TrackStore,
    detector: Option<Box<dyn Detector>>,
    previous: Option<Frame>,
    queue: FrameQueue,
    reader: FrameReader,
    placeholder: Vec<u8>,
    placeholder_seq: u64,
    dispatcher: Dispatcher,
    metrics: Arc<PipelineMetrics>,
    attribution: Arc<RwLock<Attribution>>,
    config: PipelineConfig,
    reconnect: ReconnectPolicy,
    state: FeedState,
    failed_ticks: u64,
}

impl CameraPipeline {
    /// Resolve the camera's source through `registry`. A source no driver
    /// accepts degrades to the offline placeholder feed.
    pub fn new(
        camera: &CameraConfig,
        config: PipelineConfig,
        registry: &SourceRegistry,
        dispatcher: Dispatcher,
    ) -> Result<Self> {
        let uri = SourceUri::parse(&camera.source);
        let driver: Arc<dyn SourceDriver> = match registry.resolve(&uri) {
            Some(driver) => driver,
            None => {
                tracing::warn!(
                    camera_id = %camera.camera_id,
                    source = %uri,
                    "no driver for source, serving offline placeholder"
                );
                Arc::new(OfflineDriver::new())
            }
        };

        Self::with_source(
            ManagedSource::new(driver, uri),
            camera.attribution(),
            config,
            dispatcher,
        )
    }

    pub fn with_source(
        source: ManagedSource,
        attribution: Attribution,
        config: PipelineConfig,
        dispatcher: Dispatcher,
    ) -> Result<Self> {
        config.validate()?;

        let placeholder = encode_jpeg(&offline_placeholder(), config.jpeg_quality)
            .context("Failed to encode offline placeholder")?;
        let (queue, reader) = frame_queue(config.frame_queue_capacity);
        let metrics = Arc::new(PipelineMetrics::new(attribution.camera_id.clone()));

        Ok(Self {
            source,
            scorer: MotionScorer::new(),
            escalation: EscalationMonitor::new(config.escalation.clone()),
            tracks: TrackStore::new(config.loitering.clone()),
            detector: None,
            previous: None,
            queue,
            reader,
            placeholder,
            placeholder_seq: 0,
            dispatcher: dispatcher.with_metrics(metrics.clone()),
            metrics,
            attribution: Arc::new(RwLock::new(attribution)),
            reconnect: ReconnectPolicy::fixed(config.reconnect_backoff()),
            config,
            state: FeedState::Connecting,
            failed_ticks: 0,
        })
    }

    pub fn with_detector(mut self, detector: Box<dyn Detector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_track_store(mut self, tracks: TrackStore) -> Self {
        self.tracks = tracks;
        self
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn source(&self) -> &ManagedSource {
        &self.source
    }

    pub fn escalation(&self) -> &EscalationMonitor {
        &self.escalation
    }

    pub fn tracks(&self) -> &TrackStore {
        &self.tracks
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    pub fn frames(&self) -> FrameReader {
        self.reader.clone()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// The baseline the next frame will be scored against
    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }

    pub fn attribution(&self) -> Attribution {
        read_attribution(&self.attribution)
    }

    /// Change the labels stamped on future events. The source is untouched.
    pub fn update_context(&self, camera_id: impl Into<String>, owner_id: impl Into<String>) {
        write_attribution(&self.attribution, camera_id.into(), owner_id.into());
    }

    /// Run one iteration at `now`
    pub async fn tick(&mut self, now: Instant) -> TickOutcome {
        let started = self.metrics.start_tick();
        let attribution = self.attribution();

        let outcome = match self.source.next_frame().await {
            Ok(frame) => self.process_frame(frame, now, &attribution),
            Err(e) => self.source_failed(e, now, &attribution),
        };

        for incident in &outcome.incidents {
            self.dispatcher.incident(incident.clone());
        }
        self.dispatcher.stats(outcome.stats.clone());

        self.metrics.finish_tick(started);
        outcome
    }

    fn process_frame(&mut self, frame: Frame, now: Instant, attribution: &Attribution) -> TickOutcome {
        if self.failed_ticks > 0 {
            tracing::info!(
                camera_id = %attribution.camera_id,
                attempts = self.failed_ticks,
                "feed recovered"
            );
            self.failed_ticks = 0;
        }
        let next = if self.source.driver_id() == OfflineDriver::ID {
            FeedState::Offline
        } else {
            FeedState::Live
        };
        self.transition(next, attribution);

        let mut incidents = Vec::new();
        let mut scored = false;

        // First frame after start or reconnect only seeds the baseline
        let stats = match self.previous.as_ref() {
            None => self.escalation.snapshot(now, attribution),
            Some(previous) => {
                let score = match self.scorer.try_score(previous, &frame) {
                    Ok(score) => score,
                    Err(e) => {
                        tracing::warn!(camera_id = %attribution.camera_id, error = %e, "motion scoring failed");
                        self.metrics.record_scoring_failure();
                        0.0
                    }
                };
                scored = true;
                self.metrics.record_frame_scored();
                let update = self.escalation.update(score, now, attribution);
                incidents.extend(update.incident);
                update.stats
            }
        };

        if let Some(detector) = self.detector.as_mut() {
            match detector.detect(&frame) {
                Ok(detections) => {
                    incidents.extend(self.tracks.observe(&detections, now, attribution));
                }
                Err(e) => {
                    tracing::warn!(camera_id = %attribution.camera_id, error = %e, "detector failed");
                }
            }
        }

        let (frame_pushed, frame_dropped) = match frame.encode_jpeg(self.config.jpeg_quality) {
            Ok(encoded) => self.push(encoded),
            Err(e) => {
                tracing::warn!(camera_id = %attribution.camera_id, error = %e, "frame encoding failed");
                (false, false)
            }
        };

        self.previous = Some(frame);

        TickOutcome {
            frame_pushed,
            frame_dropped,
            placeholder: false,
            scored,
            stats,
            incidents,
            backoff: None,
        }
    }

    fn source_failed(&mut self, error: SentinelError, now: Instant, attribution: &Attribution) -> TickOutcome {
        // The next live frame becomes a fresh baseline
        self.previous = None;
        self.failed_ticks += 1;
        self.metrics.record_reconnect_attempt();

        match &error {
            SentinelError::ReadFailed(_) => {
                self.metrics.record_read_failure();
                tracing::warn!(
                    camera_id = %attribution.camera_id,
                    error = %error,
                    attempts = self.failed_ticks,
                    "frame read failed, reconnecting"
                );
            }
            _ => {
                tracing::warn!(
                    camera_id = %attribution.camera_id,
                    error = %error,
                    attempts = self.failed_ticks,
                    "camera unavailable, retrying"
                );
            }
        }
        self.transition(FeedState::Reconnecting { attempts: self.failed_ticks }, attribution);

        self.placeholder_seq += 1;
        self.metrics.record_placeholder();
        let (frame_pushed, frame_dropped) =
            self.push(EncodedFrame::placeholder(self.placeholder.clone(), self.placeholder_seq));

        let backoff = self
            .reconnect
            .should_retry(self.failed_ticks)
            .then(|| self.reconnect.delay(self.failed_ticks));

        TickOutcome {
            frame_pushed,
            frame_dropped,
            placeholder: true,
            scored: false,
            stats: self.escalation.snapshot(now, attribution),
            incidents: Vec::new(),
            backoff,
        }
    }

    fn push(&self, frame: EncodedFrame) -> (bool, bool) {
        if self.queue.try_push(frame) {
            self.metrics.record_frame_pushed();
            (true, false)
        } else {
            self.metrics.record_frame_dropped();
            (false, true)
        }
    }

    fn transition(&mut self, next: FeedState, attribution: &Attribution) {
        if self.state == next {
            return;
        }
        if !self.state.can_transition_to(&next) {
            tracing::debug!(
                camera_id = %attribution.camera_id,
                from = self.state.name(),
                to = next.name(),
                "ignoring invalid feed transition"
            );
            return;
        }
        tracing::debug!(camera_id = %attribution.camera_id, from = self.state.name(), to = next.name(), "feed state");
        self.state = next;
    }

    /// Tick until `stop` is raised, then close the source
    pub async fn run(&mut self, stop: &AtomicBool) {
        tracing::info!(
            camera_id = %self.attribution().camera_id,
            driver = self.source.driver_id(),
            source = %self.source.uri(),
            "camera pipeline started"
        );

        while !stop.load(Ordering::Acquire) {
            let outcome = self.tick(Instant::now()).await;
            let pause = outcome.backoff.unwrap_or_else(|| self.config.tick_interval());
            pause_unless_stopped(pause, self.config.tick_interval(), stop).await;
        }

        self.shutdown().await;
    }

    pub async fn shutdown(&mut self) {
        self.source.close().await;
        let attribution = self.attribution();
        self.transition(FeedState::Stopped, &attribution);
        tracing::info!(camera_id = %attribution.camera_id, "camera pipeline stopped");
    }

    /// Move the loop onto its own task
    pub fn spawn(mut self) -> PipelineHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let frames = self.reader.clone();
        let attribution = self.attribution.clone();
        let metrics = self.metrics.clone();

        let task_stop = stop.clone();
        let task = tokio::spawn(async move {
            self.run(&task_stop).await;
            self
        });

        PipelineHandle {
            stop,
            task: Some(task),
            frames,
            attribution,
            metrics,
        }
    }
}

/// Control surface of a spawned pipeline
pub struct PipelineHandle {
    stop: Arc<AtomicBool>,
    task: Option<JoinHandle<CameraPipeline>>,
    frames: FrameReader,
    attribution: Arc<RwLock<Attribution>>,
    metrics: Arc<PipelineMetrics>,
}

impl PipelineHandle {
    pub fn frames(&self) -> FrameReader {
        self.frames.clone()
    }

    /// Latest queued frame, if any
    pub fn get_frame(&self) -> Option<EncodedFrame> {
        self.frames.try_next()
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    pub fn attribution(&self) -> Attribution {
        read_attribution(&self.attribution)
    }

    pub fn update_context(&self, camera_id: impl Into<String>, owner_id: impl Into<String>) {
        write_attribution(&self.attribution, camera_id.into(), owner_id.into());
    }

    /// Raise the stop flag without waiting
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }

    /// Stop the loop and wait for it to close its source
    pub async fn stop(mut self) -> Result<CameraPipeline> {
        self.request_stop();
        let task = self
            .task
            .take()
            .context("camera pipeline already joined")?;
        task.await.context("camera pipeline task failed")
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        // Can't join here; the loop notices on its next tick
        self.stop.store(true, Ordering::Release);
    }
}

/// Sleep for `duration` in `slice`-sized steps so a stop is seen within one tick
async fn pause_unless_stopped(duration: Duration, slice: Duration, stop: &AtomicBool) {
    let deadline = tokio::time::Instant::now() + duration;
    loop {
        if stop.load(Ordering::Acquire) {
            return;
        }
        let now = tokio::time::Instant::now();
        if now >= deadline {
            return;
        }
        tokio::time::sleep((deadline - now).min(slice)).await;
    }
}

fn read_attribution(lock: &RwLock<Attribution>) -> Attribution {
    lock.read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

fn write_attribution(lock: &RwLock<Attribution>, camera_id: String, owner_id: String) {
    let mut attribution = lock
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    attribution.camera_id = camera_id;
    attribution.owner_id = owner_id;
}
