pub mod classifier;
pub mod config;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod prompt;
pub mod sanitize;
pub mod storage;
pub mod worker;

pub use classifier::{classify, DocumentKind, Rejection};
pub use config::{load_config, validate_config, Config, ExtractionConfig};
pub use error::{ConfigError, DocintakeError, ExtractError, Result, StorageError, WorkerError};
pub use extraction::{ExtractionCache, ExtractionClient, ExtractionResult};
pub use pipeline::{BatchSummary, LogProgress, Pipeline, PipelineConfig, ProgressReporter};
pub use prompt::{PromptRenderer, TemplatePrompt};
pub use storage::FileRouter;
pub use worker::{DirectoryScanner, FileReport};
