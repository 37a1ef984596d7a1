use super::{ImageDirDriver, OfflineDriver, SimulatedCameraDriver, SourceDriver, SourceUri};
use std::sync::Arc;

/// Registry of available source drivers, consulted in registration order
pub struct SourceRegistry {
    drivers: Vec<Arc<dyn SourceDriver>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// Registry with every driver shipped in this crate
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(SimulatedCameraDriver::new());
        registry.register(OfflineDriver::new());
        registry.register(ImageDirDriver::new());
        registry
    }

    pub fn register(&mut self, driver: impl SourceDriver + 'static) {
        self.drivers.push(Arc::new(driver));
    }

    pub fn register_shared(&mut self, driver: Arc<dyn SourceDriver>) {
        self.drivers.push(driver);
    }

    /// First driver accepting the URI, if any
    pub fn resolve(&self, uri: &SourceUri) -> Option<Arc<dyn SourceDriver>> {
        self.drivers.iter().find(|d| d.accepts(uri)).cloned()
    }

    pub fn list_drivers(&self) -> Vec<String> {
        self.drivers.iter().map(|d| d.driver_id().to_string()).collect()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
