pub mod config;
pub mod logging;

pub mod checksum;
pub mod deps;
pub mod error;
pub mod events;
pub mod model;
pub mod pool;
pub mod progress;
pub mod retry;
pub mod runtime;
pub mod strategy;

pub use error::MdlError;
pub use events::{EventBus, JobEvent, LogStream};
pub use model::{Job, JobId, JobResult, Provider, Request};
pub use progress::{ProgressSnapshot, ProgressStatus};
pub use runtime::{Runtime, RuntimeOptions};
