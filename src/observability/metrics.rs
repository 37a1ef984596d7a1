use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Lock-free counters for one camera pipeline
pub struct PipelineMetrics {
    camera_id: String,
    ticks: AtomicU64,
    frames_scored: AtomicU64,
    frames_pushed: AtomicU64,
    frames_dropped: AtomicU64,
    placeholder_frames: AtomicU64,
    reconnect_attempts: AtomicU64,
    read_failures: AtomicU64,
    scoring_failures: AtomicU64,
    incidents: AtomicU64,
    sink_errors: AtomicU64,
    total_tick_us: AtomicU64,
    tick_samples: AtomicU64,
}

impl PipelineMetrics {
    pub fn new(camera_id: impl Into<String>) -> Self {
        Self {
            camera_id: camera_id.into(),
            ticks: AtomicU64::new(0),
            frames_scored: AtomicU64::new(0),
            frames_pushed: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            placeholder_frames: AtomicU64::new(0),
            reconnect_attempts: AtomicU64::new(0),
            read_failures: AtomicU64::new(0),
            scoring_failures: AtomicU64::new(0),
            incidents: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
            total_tick_us: AtomicU64::new(0),
            tick_samples: AtomicU64::new(0),
        }
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn frames_scored(&self) -> u64 {
        self.frames_scored.load(Ordering::Relaxed)
    }

    pub fn frames_pushed(&self) -> u64 {
        self.frames_pushed.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    pub fn placeholder_frames(&self) -> u64 {
        self.placeholder_frames.load(Ordering::Relaxed)
    }

    pub fn reconnect_attempts(&self) -> u64 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    pub fn read_failures(&self) -> u64 {
        self.read_failures.load(Ordering::Relaxed)
    }

    pub fn scoring_failures(&self) -> u64 {
        self.scoring_failures.load(Ordering::Relaxed)
    }

    pub fn incidents(&self) -> u64 {
        self.incidents.load(Ordering::Relaxed)
    }

    pub fn sink_errors(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }

    pub fn record_frame_scored(&self) {
        self.frames_scored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_pushed(&self) {
        self.frames_pushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_placeholder(&self) {
        self.placeholder_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconnect_attempt(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scoring_failure(&self) {
        self.scoring_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_incident(&self) {
        self.incidents.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_error(&self) {
        self.sink_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_tick(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_tick(&self, start: Instant) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_tick_us.fetch_add(latency_us, Ordering::Relaxed);
        self.tick_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_tick_us(&self) -> u64 {
        let samples = self.tick_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_tick_us.load(Ordering::Relaxed) / samples
    }
}
