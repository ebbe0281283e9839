pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod runner;
pub mod summary;

pub use config::PipelineConfig;
pub use context::TaskContext;
pub use error::PipelineError;
pub use progress::{LogProgress, NoopProgress, ProgressEvent, ProgressReporter, TaskPhase};
pub use runner::Pipeline;
pub use summary::BatchSummary;
