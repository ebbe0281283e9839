use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::ExtractError;

/// Finds the first candidate executable on `PATH`.
pub fn locate_interpreter(candidates: &[String]) -> Result<PathBuf, ExtractError> {
    let path_var = env::var_os("PATH");
    find_in_path(candidates, path_var.as_deref())
}

/// Same as [`locate_interpreter`] with an explicit `PATH` value.
///
/// Candidates that already contain a directory component are checked as-is
/// instead of being searched.
pub fn find_in_path(
    candidates: &[String],
    path_var: Option<&OsStr>,
) -> Result<PathBuf, ExtractError> {
    let search_dirs: Vec<PathBuf> = path_var
        .map(|p| env::split_paths(p).collect())
        .unwrap_or_default();

    for candidate in candidates {
        let candidate_path = Path::new(candidate);
        if candidate_path.components().count() > 1 {
            if is_executable(candidate_path) {
                return Ok(candidate_path.to_path_buf());
            }
            continue;
        }

        for dir in &search_dirs {
            for name in executable_names(candidate) {
                let full = dir.join(name);
                if is_executable(&full) {
                    return Ok(full);
                }
            }
        }
    }

    Err(ExtractError::InterpreterNotFound {
        candidates: candidates.to_vec(),
    })
}

/// Resolves an explicitly configured interpreter. Bare names are searched on
/// `PATH`; anything with a directory component must exist.
pub fn resolve_configured(interpreter: &str) -> Result<PathBuf, ExtractError> {
    let path = Path::new(interpreter);
    if path.components().count() > 1 {
        if is_executable(path) {
            return Ok(path.to_path_buf());
        }
        return Err(ExtractError::InterpreterMissing(path.to_path_buf()));
    }
    locate_interpreter(&[interpreter.to_string()])
}

#[cfg(windows)]
fn executable_names(name: &str) -> Vec<String> {
    vec![name.to_string(), format!("{}.exe", name)]
}

#[cfg(not(windows))]
fn executable_names(name: &str) -> Vec<String> {
    vec![name.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
