//! Eligibility gate for intake files.
//!
//! Decisions use only the file name and filesystem metadata; content is never
//! opened here.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which extraction path applies to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "jpg" | "jpeg" | "png" => Some(DocumentKind::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Image => "image",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a file was refused before extraction.
#[derive(Error, Debug)]
pub enum Rejection {
    #[error("file name is flagged as an error input")]
    FlaggedName,

    #[error("cannot read file metadata: {0}")]
    Unreadable(#[source] std::io::Error),

    #[error("file is empty")]
    Empty,

    #[error("unsupported document format: '{0}'")]
    Unsupported(String),
}

/// Classifies `path` into a [`DocumentKind`] or a [`Rejection`].
///
/// Rules apply in order: a base name containing `error` (any case) is
/// rejected first, then unreadable or zero-length files, then anything that
/// is not `.pdf`, `.jpg`, `.jpeg` or `.png`.
pub fn classify(path: &Path) -> Result<DocumentKind, Rejection> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if file_name.contains("error") {
        return Err(Rejection::FlaggedName);
    }

    let metadata = std::fs::metadata(path).map_err(Rejection::Unreadable)?;
    if metadata.len() == 0 {
        return Err(Rejection::Empty);
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    DocumentKind::from_extension(extension)
        .ok_or_else(|| Rejection::Unsupported(extension.to_string()))
}
