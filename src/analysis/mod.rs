pub mod detector;
pub mod escalation;
pub mod identity;
pub mod loitering;
pub mod motion;

pub use detector::Detector;
pub use escalation::{EscalationMonitor, EscalationPhase, EscalationUpdate};
pub use identity::{GeometryHashIdentity, IouIdentity, TrackIdentity};
pub use loitering::{Track, TrackKey, TrackPoint, TrackStore};
pub use motion::MotionScorer;
