use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use notify::{Config as NotifyConfig, PollWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer_opt, Config as DebouncerConfig, DebouncedEventKind};
use walkdir::WalkDir;

use crate::error::WorkerError;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEBOUNCE_TIMEOUT: Duration = Duration::from_millis(500);
const SHUTDOWN_CHECK: Duration = Duration::from_millis(100);

/// Enumerates files under the intake directory.
pub struct DirectoryScanner {
    intake_directory: PathBuf,
    excluded: Vec<PathBuf>,
}

impl DirectoryScanner {
    pub fn new<P: AsRef<Path>>(intake_directory: P) -> Self {
        Self {
            intake_directory: intake_directory.as_ref().to_path_buf(),
            excluded: Vec::new(),
        }
    }

    /// Directories to skip while walking, e.g. success/error directories that
    /// live inside the intake directory.
    pub fn with_excluded<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.excluded = dirs
            .into_iter()
            .map(|d| normalize(d.as_ref()))
            .collect();
        self
    }

    pub fn intake_directory(&self) -> &Path {
        &self.intake_directory
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.excluded.is_empty() {
            return false;
        }
        let path = normalize(path);
        self.excluded.iter().any(|dir| path.starts_with(dir))
    }

    /// Recursively lists every non-directory entry in walk order.
    ///
    /// Failing to read the intake directory itself is an error; unreadable
    /// entries below it are logged and skipped.
    pub fn scan(&self) -> Result<Vec<PathBuf>, WorkerError> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.intake_directory)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| !(entry.file_type().is_dir() && self.is_excluded(entry.path())));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(WorkerError::ScanFailed {
                        path: self.intake_directory.clone(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            debug!("Found file: {}", entry.path().display());
            files.push(entry.into_path());
        }

        info!(
            "Scanned {} files in {}",
            files.len(),
            self.intake_directory.display()
        );
        Ok(files)
    }

    /// Watches the intake directory and calls `on_change` with the files
    /// that appeared or changed in each debounced burst of events. Returns
    /// when `shutdown` is set or the watcher channel closes.
    pub fn watch<F>(&self, mut on_change: F, shutdown: Arc<AtomicBool>) -> Result<(), WorkerError>
    where
        F: FnMut(&[PathBuf]),
    {
        // PollWatcher works on network mounts and container volumes
        let poll_config = NotifyConfig::default().with_poll_interval(POLL_INTERVAL);

        let debouncer_config = DebouncerConfig::default()
            .with_timeout(DEBOUNCE_TIMEOUT)
            .with_notify_config(poll_config);

        let (tx, rx) = std::sync::mpsc::channel();

        let mut debouncer = new_debouncer_opt::<_, PollWatcher>(debouncer_config, tx)
            .map_err(|e| WorkerError::WatchError(e.to_string()))?;

        debouncer
            .watcher()
            .watch(&self.intake_directory, RecursiveMode::Recursive)
            .map_err(|e| WorkerError::WatchError(e.to_string()))?;

        info!("Watching directory: {}", self.intake_directory.display());

        loop {
            if shutdown.load(Ordering::Relaxed) {
                info!("Watch mode shutting down...");
                break;
            }

            match rx.recv_timeout(SHUTDOWN_CHECK) {
                Ok(Ok(events)) => {
                    let changed: Vec<PathBuf> = events
                        .into_iter()
                        .filter(|event| matches!(event.kind, DebouncedEventKind::Any))
                        .map(|event| event.path)
                        .filter(|path| path.is_file() && !self.is_excluded(path))
                        .collect();

                    if !changed.is_empty() {
                        info!("Detected {} new or changed files", changed.len());
                        on_change(&changed);
                    }
                }
                Ok(Err(e)) => {
                    warn!("Watch error: {:?}", e);
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    error!("Watch channel disconnected");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Canonical form when the path exists, otherwise the path as given.
fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
