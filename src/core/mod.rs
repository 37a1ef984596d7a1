pub mod detection;
pub mod event;
pub mod frame;

pub use detection::{BBox, Detection};
pub use event::{Attribution, IncidentEvent, IncidentKind, Severity, StatsEvent};
pub use frame::{encode_jpeg, now_us, offline_placeholder, EncodedFrame, Frame};
