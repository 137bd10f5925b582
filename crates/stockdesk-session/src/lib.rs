pub mod recorder;
pub mod registry;

pub use recorder::{Trend, TrendRecorder};
pub use registry::{DEFAULT_SESSION_IDLE, SessionId, SessionRegistry};
