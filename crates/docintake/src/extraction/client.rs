use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tracing::info_span;

use crate::classifier::DocumentKind;
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::sanitize;

use super::cache::{CachedText, ExtractionCache};
use super::interpreter;
use super::protocol::{self, ExtractionResult};
use super::runner::{CommandOutput, CommandRunner, ProcessRunner};
use super::script;

/// Turns document paths into text by running the embedded extraction
/// scripts through an external interpreter.
pub struct ExtractionClient {
    interpreter: PathBuf,
    runner: Arc<dyn CommandRunner>,
    cache: Arc<ExtractionCache>,
    timeout: Option<Duration>,
    auto_install: bool,
}

impl ExtractionClient {
    /// Production constructor. Fails when no interpreter can be located.
    pub fn from_config(
        config: &ExtractionConfig,
        cache: Arc<ExtractionCache>,
    ) -> Result<Self, ExtractError> {
        let interpreter = match &config.interpreter {
            Some(configured) => interpreter::resolve_configured(configured)?,
            None => interpreter::locate_interpreter(&config.interpreter_candidates)?,
        };
        info!("Interpreter found in: {}", interpreter.display());

        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));

        Ok(Self::with_runner(interpreter, Arc::new(ProcessRunner), cache)
            .with_timeout(timeout)
            .with_auto_install(config.auto_install))
    }

    /// Builds a client around an already-resolved interpreter and a custom
    /// runner.
    pub fn with_runner(
        interpreter: PathBuf,
        runner: Arc<dyn CommandRunner>,
        cache: Arc<ExtractionCache>,
    ) -> Self {
        Self {
            interpreter,
            runner,
            cache,
            timeout: None,
            auto_install: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auto_install(mut self, auto_install: bool) -> Self {
        self.auto_install = auto_install;
        self
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn cache(&self) -> &Arc<ExtractionCache> {
        &self.cache
    }

    /// Probes every dependency of `kind` and installs the missing ones.
    ///
    /// Must run before [`extract`](Self::extract) for the same kind.
    pub fn ensure_dependencies(&self, kind: DocumentKind) -> Result<(), ExtractError> {
        debug!("Checking {} dependencies...", kind);

        for dependency in script::dependencies(kind) {
            let module = dependency.module();
            let probe = format!("import {}", module);

            let installed = self
                .runner
                .run(
                    &self.interpreter,
                    &[OsStr::new("-c"), OsStr::new(&probe)],
                    self.timeout,
                )
                .map(|output| output.success)
                .unwrap_or(false);

            if installed {
                debug!("{} already installed", dependency.package);
                continue;
            }

            if !self.auto_install {
                return Err(ExtractError::DependencyMissing {
                    package: dependency.package.to_string(),
                    module,
                });
            }

            info!(
                "Dependency {} not found. Trying to install...",
                dependency.package
            );
            let output = self
                .runner
                .run(
                    &self.interpreter,
                    &[
                        OsStr::new("-m"),
                        OsStr::new("pip"),
                        OsStr::new("install"),
                        OsStr::new(dependency.package),
                    ],
                    self.timeout,
                )
                .map_err(|e| ExtractError::DependencyInstall {
                    package: dependency.package.to_string(),
                    reason: e.to_string(),
                })?;

            if !output.success {
                return Err(ExtractError::DependencyInstall {
                    package: dependency.package.to_string(),
                    reason: install_failure_reason(&output),
                });
            }
            info!("{} installed successfully", dependency.package);
        }

        Ok(())
    }

    /// Extracts the text of `path`.
    ///
    /// Never fails: every problem comes back as a result with
    /// `success == false`. Successful results are cached under the exact path
    /// and later calls for that path skip the subprocess.
    pub fn extract(&self, path: &Path, kind: DocumentKind) -> ExtractionResult {
        let filename = sanitize::redact_path(path);
        let _span = info_span!("extract", kind = %kind, filename = %filename).entered();

        if let Some(cached) = self.cache.get(path) {
            debug!("Serving {} from cache", filename);
            return ExtractionResult::success(filename, cached.text, cached.page_count);
        }

        match self.run_script(path, kind) {
            Ok(result) => {
                if result.success {
                    self.cache.insert(
                        path,
                        CachedText {
                            text: result.text.clone(),
                            page_count: result.page_count,
                        },
                    );
                }
                result
            }
            Err(e) => {
                warn!("Extraction of {} failed: {}", filename, e);
                ExtractionResult::failure(filename, e.to_string())
            }
        }
    }

    fn run_script(
        &self,
        path: &Path,
        kind: DocumentKind,
    ) -> Result<ExtractionResult, ExtractError> {
        // Removed when `script` drops, on every return path
        let script = script::materialize(kind)?;

        let output = self.runner.run(
            &self.interpreter,
            &[script.path().as_os_str(), path.as_os_str()],
            self.timeout,
        )?;
        log_diagnostics(&output);

        if !output.success {
            return Err(ExtractError::Exited {
                status: output.status_label(),
            });
        }

        protocol::parse_output(&output.combined())
    }
}

fn log_diagnostics(output: &CommandOutput) {
    for (label, stream) in [("STDOUT", &output.stdout), ("STDERR", &output.stderr)] {
        for line in stream.lines() {
            if !line.trim().is_empty() && !protocol::is_marker_line(line) {
                debug!("[{}] {}", label, line);
            }
        }
    }
}

fn install_failure_reason(output: &CommandOutput) -> String {
    let detail = output
        .stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("");
    if detail.is_empty() {
        format!("pip exited with {}", output.status_label())
    } else {
        format!("pip exited with {}: {}", output.status_label(), detail.trim())
    }
}
