use thiserror::Error;

use crate::classifier::Rejection;
use crate::error::ExtractError;

/// Why one file failed processing. Never escapes the per-file step; it is
/// turned into a [`FileReport`](crate::worker::FileReport) and the file is
/// routed to the error directory.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Dependency check failed: {0}")]
    Dependencies(#[source] ExtractError),

    #[error("Extraction failed: {0}")]
    Extraction(String),
}
