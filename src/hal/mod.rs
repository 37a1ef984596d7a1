pub mod drivers;
pub mod lifecycle;
pub mod mock;
pub mod registry;
pub mod traits;
pub mod types;

pub use drivers::{ImageDirDriver, OfflineDriver};
pub use lifecycle::ManagedSource;
pub use mock::SimulatedCameraDriver;
pub use registry::SourceRegistry;
pub use traits::{FrameSource, SourceDriver};
pub use types::SourceUri;
