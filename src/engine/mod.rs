pub mod frame_queue;
pub mod kernel;
pub mod pipeline;
pub mod state;

pub use frame_queue::{frame_queue, FrameQueue, FrameReader};
pub use kernel::{DetectorFactory, KernelStatus, SentinelKernel};
pub use pipeline::{CameraPipeline, PipelineHandle, TickOutcome};
pub use state::FeedState;
