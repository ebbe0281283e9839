use std::fmt;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Phase of one file's pass through the pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    Classifying,
    CheckingDependencies,
    Extracting,
    RenderingPrompt,
    Routing,
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPhase::Classifying => write!(f, "Classifying"),
            TaskPhase::CheckingDependencies => write!(f, "Checking dependencies"),
            TaskPhase::Extracting => write!(f, "Extracting text"),
            TaskPhase::RenderingPrompt => write!(f, "Rendering prompt"),
            TaskPhase::Routing => write!(f, "Routing"),
        }
    }
}

/// Events emitted by the pipeline while processing a file.
/// Extracted text and prompts are omitted (can be large).
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Started {
        task_id: String,
        filename: String,
    },
    Phase {
        task_id: String,
        phase: TaskPhase,
    },
    Completed {
        task_id: String,
        filename: String,
        destination: PathBuf,
        char_count: usize,
    },
    Failed {
        task_id: String,
        filename: String,
        error: String,
    },
    RouteFailed {
        task_id: String,
        filename: String,
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes every event to the log.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { task_id, filename } => {
                info!("[{}] Processing file: {}", short(&task_id), filename);
            }
            ProgressEvent::Phase { task_id, phase } => {
                debug!("[{}] {}", short(&task_id), phase);
            }
            ProgressEvent::Completed {
                task_id,
                filename,
                destination,
                char_count,
            } => {
                info!(
                    "[{}] Processed successfully: {} ({} characters) -> {}",
                    short(&task_id),
                    filename,
                    char_count,
                    destination.display()
                );
            }
            ProgressEvent::Failed {
                task_id,
                filename,
                error,
            } => {
                warn!("[{}] Error processing {}: {}", short(&task_id), filename, error);
            }
            ProgressEvent::RouteFailed {
                task_id,
                filename,
                error,
            } => {
                warn!(
                    "[{}] Could not move {}, left in place: {}",
                    short(&task_id),
                    filename,
                    error
                );
            }
        }
    }
}

fn short(task_id: &str) -> &str {
    task_id.get(..8).unwrap_or(task_id)
}
