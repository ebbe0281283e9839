use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocintakeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No interpreter found on PATH (tried: {})", .candidates.join(", "))]
    InterpreterNotFound { candidates: Vec<String> },

    #[error("Configured interpreter does not exist: {0}")]
    InterpreterMissing(PathBuf),

    #[error("Dependency {package} is not installed (import {module} failed)")]
    DependencyMissing { package: String, module: String },

    #[error("Failed to install {package}: {reason}. Try manually: pip install {package}")]
    DependencyInstall { package: String, reason: String },

    #[error("Failed to materialize extraction script: {0}")]
    TempScript(#[source] std::io::Error),

    #[error("Failed to run interpreter: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Extraction script exited with {status}")]
    Exited { status: String },

    #[error("extraction timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("invalid output format")]
    InvalidOutput,

    #[error("invalid output format")]
    InvalidJson(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("Path has no file name: {0}")]
    NoFileName(PathBuf),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Watch error: {0}")]
    WatchError(String),
}

pub type Result<T> = std::result::Result<T, DocintakeError>;
