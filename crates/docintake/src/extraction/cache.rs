use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use crate::sanitize;

const PREVIEW_CHARS: usize = 200;

/// A successful extraction remembered for its source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedText {
    pub text: String,
    pub page_count: u32,
}

/// Short description of one cache entry, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntrySummary {
    pub filename: String,
    pub char_count: usize,
    pub preview: String,
}

/// Process-local store of extracted text keyed by the exact path, byte for
/// byte. Non-UTF-8 paths stay distinct.
///
/// Only successful extractions are stored. Lookups take the read lock and
/// inserts take the write lock separately, so two workers missing on the same
/// key may both extract it; the second insert simply overwrites the first.
#[derive(Debug, Default)]
pub struct ExtractionCache {
    entries: RwLock<HashMap<OsString, CachedText>>,
}

impl ExtractionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<CachedText> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key.as_ref())
            .cloned()
    }

    pub fn insert(&self, key: impl Into<OsString>, entry: CachedText) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), entry);
    }

    pub fn contains(&self, key: impl AsRef<OsStr>) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Summaries sorted by filename, with newlines flattened in previews.
    pub fn summaries(&self) -> Vec<CacheEntrySummary> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        let mut summaries: Vec<CacheEntrySummary> = entries
            .iter()
            .map(|(path, cached)| {
                let filename = Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string_lossy().into_owned());
                CacheEntrySummary {
                    filename,
                    char_count: cached.text.chars().count(),
                    preview: sanitize::preview(&cached.text, PREVIEW_CHARS),
                }
            })
            .collect();

        summaries.sort_by(|a, b| a.filename.cmp(&b.filename));
        summaries
    }
}
