//! Marker-framed result protocol spoken by the extraction scripts.
//!
//! Scripts may print any number of progress lines. The authoritative result
//! is the JSON object between [`RESULT_START`] and the first [`RESULT_END`]
//! that follows it.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

pub const RESULT_START: &str = "JSON_RESULT_START";
pub const RESULT_END: &str = "JSON_RESULT_END";

/// Outcome of extracting one document.
///
/// `success` implies an empty `error`; a failure always carries an empty
/// `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub error: String,
    #[serde(default, rename = "pages")]
    pub page_count: u32,
    #[serde(default)]
    pub filename: String,
}

impl ExtractionResult {
    pub fn success(filename: impl Into<String>, text: impl Into<String>, page_count: u32) -> Self {
        Self {
            success: true,
            text: text.into(),
            error: String::new(),
            page_count,
            filename: filename.into(),
        }
    }

    pub fn failure(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: String::new(),
            error: error.into(),
            page_count: 0,
            filename: filename.into(),
        }
    }

    fn normalized(mut self) -> Self {
        if self.success {
            self.error.clear();
        } else {
            self.text.clear();
        }
        self
    }
}

/// Pulls the framed result out of raw script output.
pub fn parse_output(output: &str) -> Result<ExtractionResult, ExtractError> {
    let start = output
        .find(RESULT_START)
        .ok_or(ExtractError::InvalidOutput)?
        + RESULT_START.len();
    let end = output[start..]
        .find(RESULT_END)
        .ok_or(ExtractError::InvalidOutput)?;

    let body = output[start..start + end].trim();
    let result: ExtractionResult = serde_json::from_str(body).map_err(|e| {
        debug!("Result JSON did not decode: {}", e);
        ExtractError::InvalidJson(e)
    })?;

    Ok(result.normalized())
}

/// True for output lines that belong to the framing rather than diagnostics.
pub fn is_marker_line(line: &str) -> bool {
    line.contains("JSON_RESULT")
}
