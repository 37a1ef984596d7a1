use crate::core::Frame;
use crate::error::Result;
use async_trait::async_trait;

use super::types::SourceUri;

/// Implemented by acquisition backends; opens handles for matching URIs
#[async_trait]
pub trait SourceDriver: Send + Sync {
    /// Unique driver identifier (e.g., "sim", "image-dir")
    fn driver_id(&self) -> &str;

    /// Whether this driver understands the given source
    fn accepts(&self, uri: &SourceUri) -> bool;

    /// Open a device handle. Fails with `DeviceUnavailable`.
    async fn open(&self, uri: &SourceUri) -> Result<Box<dyn FrameSource>>;
}

/// An open device handle
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame. Fails with `ReadFailed`; the caller discards the handle.
    async fn read(&mut self) -> Result<Frame>;

    /// Release the device. Must be idempotent.
    async fn close(&mut self);

    /// False once the underlying device is gone
    fn is_open(&self) -> bool {
        true
    }
}
