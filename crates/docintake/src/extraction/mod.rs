//! Subprocess-backed text extraction.
//!
//! The [`ExtractionClient`] materializes an embedded script per
//! [`DocumentKind`](crate::classifier::DocumentKind), runs it through the
//! located interpreter and reads back a marker-framed JSON result.

pub mod cache;
pub mod client;
pub mod interpreter;
pub mod protocol;
pub mod runner;
pub mod script;

pub use cache::{CacheEntrySummary, CachedText, ExtractionCache};
pub use client::ExtractionClient;
pub use protocol::{parse_output, ExtractionResult, RESULT_END, RESULT_START};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
pub use script::Dependency;
