//! Test harness for isolated pipeline runs.
//!
//! The `TestHarness` owns a temporary directory with `to-process`, `success`
//! and `error` subdirectories and builds pipelines whose interpreter is a
//! [`FakeInterpreter`], so no real Python is needed.

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use docintake::config::{Config, ExtractionConfig};
use docintake::error::ExtractError;
use docintake::extraction::{CommandOutput, CommandRunner, ExtractionCache, ExtractionClient};
use docintake::pipeline::{Pipeline, PipelineConfig};
use docintake::prompt::TemplatePrompt;
use docintake::storage::FileRouter;

/// Marker-framed stdout for a result, as the extraction scripts print it.
pub fn marker_output(success: bool, text: &str, error: &str, pages: u32, filename: &str) -> String {
    let json = serde_json::json!({
        "success": success,
        "text": text,
        "error": error,
        "pages": pages,
        "filename": filename,
    });
    format!(
        "Extracting...\nJSON_RESULT_START\n{}\nJSON_RESULT_END\n",
        serde_json::to_string_pretty(&json).unwrap()
    )
}

/// Scripted interpreter.
///
/// Dependency probes succeed unless the module was marked missing; pip
/// installs succeed unless `fail_installs` was called. Script runs answer
/// with the stdout registered for the target's file name, or
/// `default_stdout`.
pub struct FakeInterpreter {
    default_stdout: String,
    by_filename: Mutex<HashMap<String, String>>,
    missing_modules: Mutex<Vec<String>>,
    installs_fail: AtomicBool,
    extractions: AtomicUsize,
    probes: AtomicUsize,
    installs: AtomicUsize,
    targets: Mutex<Vec<PathBuf>>,
}

impl FakeInterpreter {
    pub fn new(default_stdout: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            default_stdout: default_stdout.into(),
            by_filename: Mutex::new(HashMap::new()),
            missing_modules: Mutex::new(Vec::new()),
            installs_fail: AtomicBool::new(false),
            extractions: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            installs: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        })
    }

    /// Interpreter that reports `hello` on one page for every file.
    pub fn hello() -> Arc<Self> {
        Self::new(marker_output(true, "hello", "", 1, "doc.pdf"))
    }

    pub fn respond_for(&self, filename: &str, stdout: impl Into<String>) {
        self.by_filename
            .lock()
            .unwrap()
            .insert(filename.to_string(), stdout.into());
    }

    /// Makes `import <module>` fail.
    pub fn missing_module(&self, module: &str) {
        self.missing_modules.lock().unwrap().push(module.to_string());
    }

    pub fn fail_installs(&self) {
        self.installs_fail.store(true, Ordering::SeqCst);
    }

    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    pub fn extractions(&self) -> usize {
        self.extractions.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn targets(&self) -> Vec<PathBuf> {
        self.targets.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeInterpreter {
    fn run(
        &self,
        _program: &Path,
        args: &[&OsStr],
        _timeout: Option<Duration>,
    ) -> Result<CommandOutput, ExtractError> {
        let first = args.first().map(|a| a.to_string_lossy().into_owned());
        match first.as_deref() {
            Some("-c") => {
                self.probes.fetch_add(1, Ordering::SeqCst);
                let probe = args.get(1).map(|a| a.to_string_lossy().into_owned());
                let module = probe.as_deref().unwrap_or("").trim_start_matches("import ");
                let missing = self.missing_modules.lock().unwrap().iter().any(|m| m == module);
                return Ok(exit_with(if missing { 1 } else { 0 }, ""));
            }
            Some("-m") => {
                self.installs.fetch_add(1, Ordering::SeqCst);
                if self.installs_fail.load(Ordering::SeqCst) {
                    return Ok(exit_with(1, "ERROR: Could not install packages\n"));
                }
                return Ok(exit_with(0, ""));
            }
            _ => {}
        }

        self.extractions.fetch_add(1, Ordering::SeqCst);
        let target = PathBuf::from(args.get(1).copied().unwrap_or_default());
        self.targets.lock().unwrap().push(target.clone());

        let filename = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stdout = self
            .by_filename
            .lock()
            .unwrap()
            .get(&filename)
            .cloned()
            .unwrap_or_else(|| self.default_stdout.clone());

        Ok(CommandOutput {
            success: true,
            code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }
}

fn exit_with(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        success: code == 0,
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Isolated intake/success/error layout.
pub struct TestHarness {
    temp_dir: TempDir,
    pub intake_dir: PathBuf,
    pub success_dir: PathBuf,
    pub error_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let intake_dir = base.join("to-process");
        let success_dir = base.join("success");
        let error_dir = base.join("error");

        std::fs::create_dir_all(&intake_dir).expect("Failed to create intake dir");

        Self {
            temp_dir,
            intake_dir,
            success_dir,
            error_dir,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Config pointing at the harness directories.
    pub fn config(&self, worker_count: usize) -> Config {
        Config {
            intake_directory: self.intake_dir.to_string_lossy().into_owned(),
            success_directory: self.success_dir.to_string_lossy().into_owned(),
            error_directory: self.error_dir.to_string_lossy().into_owned(),
            worker_count,
            extraction: ExtractionConfig::default(),
            prompt_template: None,
        }
    }

    /// Pipeline over the harness directories driven by `interpreter`.
    pub fn pipeline(&self, interpreter: Arc<FakeInterpreter>, worker_count: usize) -> Pipeline {
        self.pipeline_with_cache(interpreter, worker_count, Arc::new(ExtractionCache::new()))
    }

    pub fn pipeline_with_cache(
        &self,
        interpreter: Arc<FakeInterpreter>,
        worker_count: usize,
        cache: Arc<ExtractionCache>,
    ) -> Pipeline {
        let config = PipelineConfig::from_config(&self.config(worker_count));
        let client =
            ExtractionClient::with_runner(PathBuf::from("/usr/bin/python3"), interpreter, cache);
        let router = FileRouter::new(&config.success_directory, &config.error_directory);

        Pipeline::new(
            Arc::new(config),
            client,
            router,
            Box::new(TemplatePrompt::default()),
        )
        .expect("Failed to build pipeline")
    }

    /// Write a file into the intake directory.
    pub fn write_input(&self, filename: &str, content: &[u8]) -> PathBuf {
        let path = self.intake_dir.join(filename);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create input parent");
        }
        std::fs::write(&path, content).expect("Failed to write input file");
        path
    }

    /// Names of the files directly inside `dir`, sorted.
    pub fn list(&self, dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().is_file())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
