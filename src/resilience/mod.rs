pub mod dispatch;
pub mod policy;

pub use dispatch::Dispatcher;
pub use policy::ReconnectPolicy;
