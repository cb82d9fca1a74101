//! Immutable configuration and progress types.

pub mod cancel;
pub mod options;
pub mod progress;

pub use cancel::CancelFlag;
pub use options::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ATTEMPTS, FetchOptions, ProgressSink};
pub use progress::{FetchPhase, Progress};
