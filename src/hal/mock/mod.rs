pub mod simulated;

pub use simulated::{SimulatedCamera, SimulatedCameraConfig, SimulatedCameraDriver};
