use crate::core::{offline_placeholder, Frame};
use crate::error::Result;
use crate::hal::{FrameSource, SourceDriver, SourceUri};
use async_trait::async_trait;
use image::RgbImage;
use std::sync::Arc;

/// Emits the static "feed offline" card forever. Used for `offline://` and
/// as the degraded source when no driver can serve the configured URI.
pub struct OfflineDriver {
    placeholder: Arc<RgbImage>,
}

impl OfflineDriver {
    pub const ID: &'static str = "offline";

    pub fn new() -> Self {
        Self {
            placeholder: Arc::new(offline_placeholder()),
        }
    }
}

impl Default for OfflineDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceDriver for OfflineDriver {
    fn driver_id(&self) -> &str {
        Self::ID
    }

    fn accepts(&self, uri: &SourceUri) -> bool {
        uri.scheme == "offline"
    }

    async fn open(&self, _uri: &SourceUri) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(OfflineSource {
            placeholder: self.placeholder.clone(),
            sequence: 0,
        }))
    }
}

struct OfflineSource {
    placeholder: Arc<RgbImage>,
    sequence: u64,
}

#[async_trait]
impl FrameSource for OfflineSource {
    async fn read(&mut self) -> Result<Frame> {
        self.sequence += 1;
        Ok(Frame::new(self.placeholder.as_ref().clone(), self.sequence))
    }

    async fn close(&mut self) {}
}
