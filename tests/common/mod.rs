#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use sentinel::config::PipelineConfig;
use sentinel::core::Frame;
use sentinel::error::{Result, SentinelError};
use sentinel::hal::{FrameSource, ManagedSource, SourceDriver, SourceUri};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub const SIZE: u32 = 32;

/// What the scripted device does on its next call
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// `read` returns a solid frame of this luma
    Frame(u8),
    /// `read` fails
    ReadFail,
    /// `open` fails
    OpenFail,
}

/// Driver whose behaviour is played back from a script; once the script
/// runs out every read returns a black frame.
#[derive(Clone, Default)]
pub struct ScriptedDriver {
    script: Arc<Mutex<VecDeque<Step>>>,
    pub opens: Arc<AtomicU64>,
    pub closes: Arc<AtomicU64>,
}

impl ScriptedDriver {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into_iter().collect())),
            ..Self::default()
        }
    }

    pub fn managed(&self) -> ManagedSource {
        ManagedSource::new(Arc::new(self.clone()), SourceUri::parse("scripted://test"))
    }

    pub fn opens(&self) -> u64 {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::SeqCst)
    }

    fn pop_if(&self, want_open_fail: bool) -> Option<Step> {
        let mut script = self.script.lock().unwrap();
        match script.front() {
            Some(Step::OpenFail) if want_open_fail => script.pop_front(),
            Some(Step::OpenFail) => None,
            Some(_) if !want_open_fail => script.pop_front(),
            _ => None,
        }
    }
}

#[async_trait]
impl SourceDriver for ScriptedDriver {
    fn driver_id(&self) -> &str {
        "scripted"
    }

    fn accepts(&self, uri: &SourceUri) -> bool {
        uri.scheme == "scripted"
    }

    async fn open(&self, _uri: &SourceUri) -> Result<Box<dyn FrameSource>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.pop_if(true).is_some() {
            return Err(SentinelError::device_unavailable("scripted open failure"));
        }
        Ok(Box::new(ScriptedSource {
            driver: self.clone(),
            sequence: 0,
            open: true,
        }))
    }
}

struct ScriptedSource {
    driver: ScriptedDriver,
    sequence: u64,
    open: bool,
}

#[async_trait]
impl FrameSource for ScriptedSource {
    async fn read(&mut self) -> Result<Frame> {
        self.sequence += 1;
        match self.driver.pop_if(false) {
            Some(Step::ReadFail) => Err(SentinelError::read_failed("scripted read failure")),
            Some(Step::Frame(luma)) => Ok(solid_frame(luma, self.sequence)),
            _ => Ok(solid_frame(0, self.sequence)),
        }
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            self.driver.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub fn solid_frame(luma: u8, sequence_id: u64) -> Frame {
    Frame::new(RgbImage::from_pixel(SIZE, SIZE, Rgb([luma, luma, luma])), sequence_id)
}

pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        tick_interval_ms: 5,
        reconnect_backoff_ms: 20,
        ..PipelineConfig::default()
    }
}
