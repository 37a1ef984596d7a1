use super::{FrameSource, SourceDriver, SourceUri};
use crate::core::Frame;
use crate::error::{Result, SentinelError};
use std::sync::Arc;

/// Owns the nullable device handle for one camera.
///
/// The handle is opened lazily on the first `next_frame` after construction
/// or after a failure. Any read failure closes and drops it; the next call
/// opens a fresh one. There is no retry cap.
pub struct ManagedSource {
    driver: Arc<dyn SourceDriver>,
    uri: SourceUri,
    handle: Option<Box<dyn FrameSource>>,
    open_attempts: u64,
}

impl ManagedSource {
    pub fn new(driver: Arc<dyn SourceDriver>, uri: SourceUri) -> Self {
        Self {
            driver,
            uri,
            handle: None,
            open_attempts: 0,
        }
    }

    pub fn driver_id(&self) -> &str {
        self.driver.driver_id()
    }

    pub fn uri(&self) -> &SourceUri {
        &self.uri
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Total `open` calls made so far, successful or not
    pub fn open_attempts(&self) -> u64 {
        self.open_attempts
    }

    pub async fn next_frame(&mut self) -> Result<Frame> {
        if self.handle.is_none() {
            self.open_attempts += 1;
            let handle = self.driver.open(&self.uri).await.map_err(|e| match e {
                SentinelError::DeviceUnavailable(_) => e,
                other => SentinelError::device_unavailable(other.to_string()),
            })?;
            self.handle = Some(handle);
        }

        let Some(handle) = self.handle.as_mut() else {
            return Err(SentinelError::device_unavailable("no handle"));
        };

        if !handle.is_open() {
            self.discard().await;
            return Err(SentinelError::read_failed("device handle closed"));
        }

        match handle.read().await {
            Ok(frame) => Ok(frame),
            Err(e) => {
                self.discard().await;
                Err(match e {
                    SentinelError::ReadFailed(_) => e,
                    other => SentinelError::read_failed(other.to_string()),
                })
            }
        }
    }

    /// Close and null the handle; the next read reopens
    pub async fn discard(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.close().await;
        }
    }

    pub async fn close(&mut self) {
        self.discard().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::SimulatedCameraDriver;

    #[tokio::test]
    async fn test_lazy_open() {
        let mut source = ManagedSource::new(
            Arc::new(SimulatedCameraDriver::new()),
            SourceUri::parse("sim://t?width=16&height=16"),
        );
        assert!(!source.is_open());
        assert_eq!(source.open_attempts(), 0);

        source.next_frame().await.unwrap();
        source.next_frame().await.unwrap();
        assert!(source.is_open());
        assert_eq!(source.open_attempts(), 1);

        source.close().await;
        assert!(!source.is_open());
    }
}
