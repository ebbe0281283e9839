use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::classifier::DocumentKind;

/// Where a processed file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingOutcome {
    Success(PathBuf),
    Error(PathBuf),
    /// The move failed; the file was left where it was.
    MoveFailed(String),
}

impl RoutingOutcome {
    pub fn destination(&self) -> Option<&Path> {
        match self {
            RoutingOutcome::Success(path) | RoutingOutcome::Error(path) => Some(path),
            RoutingOutcome::MoveFailed(_) => None,
        }
    }
}

/// One enumerated intake file, alive for the duration of a batch run.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub id: String,
    pub path: PathBuf,
    pub kind: Option<DocumentKind>,
    pub outcome: Option<RoutingOutcome>,
}

impl FileTask {
    pub fn new(path: PathBuf) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            path,
            kind: None,
            outcome: None,
        }
    }

    /// First 8 characters of the id, for log lines.
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

/// Record of one file's pass through the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub task_id: String,
    pub source_path: PathBuf,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DocumentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    pub char_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_error: Option<String>,
}

impl FileReport {
    pub fn success(task: &FileTask, page_count: u32, char_count: usize, prompt: String) -> Self {
        Self {
            task_id: task.id.clone(),
            source_path: task.path.clone(),
            success: true,
            destination: None,
            kind: task.kind,
            page_count: Some(page_count),
            char_count,
            prompt: Some(prompt),
            error: None,
            routing_error: None,
        }
    }

    pub fn failure(task: &FileTask, error: String) -> Self {
        Self {
            task_id: task.id.clone(),
            source_path: task.path.clone(),
            success: false,
            destination: None,
            kind: task.kind,
            page_count: None,
            char_count: 0,
            prompt: None,
            error: Some(error),
            routing_error: None,
        }
    }

    pub fn with_routing(mut self, outcome: &RoutingOutcome) -> Self {
        match outcome {
            RoutingOutcome::Success(path) | RoutingOutcome::Error(path) => {
                self.destination = Some(path.clone());
            }
            RoutingOutcome::MoveFailed(error) => {
                self.routing_error = Some(error.clone());
            }
        }
        self
    }

    pub fn route_failed(&self) -> bool {
        self.routing_error.is_some()
    }
}
