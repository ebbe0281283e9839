use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, info};

use crate::error::StorageError;

/// Format of the timestamp inserted into colliding file names.
pub const COLLISION_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const MAX_SUFFIX: u32 = 1000;

/// Terminal directory a processed file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Success,
    Error,
}

/// Moves processed files into the success or error directory, never
/// overwriting a file that is already there.
pub struct FileRouter {
    success_directory: PathBuf,
    error_directory: PathBuf,
}

impl FileRouter {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(success_directory: P, error_directory: Q) -> Self {
        Self {
            success_directory: success_directory.as_ref().to_path_buf(),
            error_directory: error_directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self, destination: Destination) -> &Path {
        match destination {
            Destination::Success => &self.success_directory,
            Destination::Error => &self.error_directory,
        }
    }

    /// Creates both terminal directories if they are missing.
    pub fn ensure_directories(&self) -> Result<(), StorageError> {
        ensure_directory(&self.success_directory)?;
        ensure_directory(&self.error_directory)
    }

    /// Moves `source` into the directory for `destination` and returns the
    /// final path.
    pub fn route(&self, source: &Path, destination: Destination) -> Result<PathBuf, StorageError> {
        route_to(source, self.directory(destination))
    }
}

/// Moves `source` into `directory`, keeping its name unless that name is
/// taken, in which case a `YYYYMMDD_HHMMSS` timestamp is inserted before the
/// extension.
pub fn route_to(source: &Path, directory: &Path) -> Result<PathBuf, StorageError> {
    let timestamp = Local::now().format(COLLISION_TIMESTAMP_FORMAT).to_string();
    route_with_timestamp(source, directory, &timestamp)
}

/// Claims the first free candidate name with an exclusive create, then moves
/// `source` onto the claimed path. A name another writer got first is never
/// replaced.
fn route_with_timestamp(
    source: &Path,
    directory: &Path,
    timestamp: &str,
) -> Result<PathBuf, StorageError> {
    let file_name = source
        .file_name()
        .ok_or_else(|| StorageError::NoFileName(source.to_path_buf()))?;

    for counter in 0..=MAX_SUFFIX {
        let target = directory.join(candidate_name(file_name, timestamp, counter));

        // O_CREAT | O_EXCL; a dangling symlink also counts as taken
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(StorageError::MoveFile {
                    from: source.to_path_buf(),
                    to: target,
                    source: e,
                })
            }
        }

        if counter > 0 {
            debug!(
                "Name collision for {}, using {}",
                file_name.to_string_lossy(),
                target.display()
            );
        }

        move_file(source, &target)?;
        info!("File moved to: {}", target.display());
        return Ok(target);
    }

    Err(StorageError::FileExists(directory.join(file_name)))
}

/// Name tried for the `counter`-th attempt: the original name first, then
/// `stem_<timestamp>.ext`, then `stem_<timestamp>_2.ext`, `_3`, and so on.
/// Dotfiles such as `.env` have no extension.
fn candidate_name(file_name: &OsStr, timestamp: &str, counter: u32) -> OsString {
    if counter == 0 {
        return file_name.to_os_string();
    }

    let path = Path::new(file_name);
    let mut name = path.file_stem().unwrap_or(file_name).to_os_string();
    name.push("_");
    name.push(timestamp);
    if counter > 1 {
        name.push(format!("_{}", counter));
    }
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

/// Moves `src` onto `dst`, a placeholder this process created. Renames when
/// possible and falls back to copy + remove (e.g. across filesystems). On
/// failure the placeholder or partial copy is removed so the source stays the
/// only copy.
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    let move_error = |source: std::io::Error| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source,
    };

    debug!("Rename failed for {}, copying", src.display());
    if let Err(e) = std::fs::copy(src, dst) {
        let _ = std::fs::remove_file(dst);
        return Err(move_error(e));
    }
    if let Err(e) = std::fs::remove_file(src) {
        let _ = std::fs::remove_file(dst);
        return Err(move_error(e));
    }
    Ok(())
}

fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}
