use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analysis::Detector;
use crate::config::{CameraConfig, SentinelConfig};
use crate::engine::pipeline::{CameraPipeline, PipelineHandle};
use crate::hal::SourceRegistry;
use crate::observability::{MetricsCollector, PipelineMonitor};
use crate::resilience::Dispatcher;

/// Builds the detector for a camera, or `None` to run motion analysis only
pub type DetectorFactory = Arc<dyn Fn(&CameraConfig) -> Option<Box<dyn Detector>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelStatus {
    Stopped,
    Running,
}

/// Runs one independent pipeline per configured camera
pub struct SentinelKernel {
    config: SentinelConfig,
    registry: SourceRegistry,
    dispatcher: Dispatcher,
    detectors: Option<DetectorFactory>,
    handles: BTreeMap<String, PipelineHandle>,
    collector: MetricsCollector,
    status: KernelStatus,
}

impl SentinelKernel {
    pub fn new(config: SentinelConfig, registry: SourceRegistry, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            registry,
            dispatcher,
            detectors: None,
            handles: BTreeMap::new(),
            collector: MetricsCollector::new(),
            status: KernelStatus::Stopped,
        }
    }

    pub fn with_detectors(mut self, factory: DetectorFactory) -> Self {
        self.detectors = Some(factory);
        self
    }

    pub fn status(&self) -> KernelStatus {
        self.status
    }

    pub fn camera_count(&self) -> usize {
        self.handles.len()
    }

    /// Handle of a running camera, keyed by the id it was configured with
    pub fn handle(&self, camera_id: &str) -> Option<&PipelineHandle> {
        self.handles.get(camera_id)
    }

    pub fn camera_ids(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(String::as_str)
    }

    /// Start every camera. A camera that fails to build is logged and skipped;
    /// start fails only if none came up.
    pub async fn start(&mut self) -> Result<()> {
        if self.status == KernelStatus::Running {
            return Err(anyhow!("Kernel is already running"));
        }

        for camera in &self.config.cameras {
            let pipeline = match CameraPipeline::new(
                camera,
                self.config.pipeline.clone(),
                &self.registry,
                self.dispatcher.clone(),
            ) {
                Ok(pipeline) => pipeline,
                Err(e) => {
                    tracing::error!(camera_id = %camera.camera_id, error = %e, "failed to build camera pipeline");
                    continue;
                }
            };

            let pipeline = match self.detectors.as_ref().and_then(|factory| factory(camera)) {
                Some(detector) => pipeline.with_detector(detector),
                None => pipeline,
            };

            self.collector
                .register(camera.camera_id.clone(), pipeline.metrics());
            self.handles
                .insert(camera.camera_id.clone(), pipeline.spawn());
        }

        if self.handles.is_empty() && !self.config.cameras.is_empty() {
            return Err(anyhow!("All cameras failed to start"));
        }

        tracing::info!(cameras = self.handles.len(), "sentinel kernel running");
        self.status = KernelStatus::Running;
        Ok(())
    }

    /// Stop every camera and wait for its source to close
    pub async fn stop(&mut self) -> Result<()> {
        if self.status == KernelStatus::Stopped {
            return Ok(());
        }

        for handle in self.handles.values() {
            handle.request_stop();
        }
        let handles = std::mem::take(&mut self.handles);
        for (camera_id, handle) in handles {
            if let Err(e) = handle.stop().await {
                tracing::error!(camera_id = %camera_id, error = %e, "camera pipeline did not stop cleanly");
            }
        }

        self.status = KernelStatus::Stopped;
        tracing::info!("sentinel kernel stopped");
        Ok(())
    }

    /// Report over every camera started so far, stopped ones included
    pub fn monitor(&self) -> PipelineMonitor {
        PipelineMonitor::new(self.collector.clone())
    }
}

impl Drop for SentinelKernel {
    fn drop(&mut self) {
        // Dropping the handles raises each stop flag; nothing is awaited
        for handle in self.handles.values() {
            handle.request_stop();
        }
    }
}
