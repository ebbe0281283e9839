use serde::{Deserialize, Serialize};

/// Top-level configuration for the intake pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_intake_directory")]
    pub intake_directory: String,
    #[serde(default = "default_success_directory")]
    pub success_directory: String,
    #[serde(default = "default_error_directory")]
    pub error_directory: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Path to a prompt template file. The embedded template is used when unset.
    #[serde(default)]
    pub prompt_template: Option<String>,
}

fn default_intake_directory() -> String {
    "./learning/to-process".to_string()
}

fn default_success_directory() -> String {
    "./learning/success".to_string()
}

fn default_error_directory() -> String {
    "./learning/error".to_string()
}

fn default_worker_count() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            intake_directory: default_intake_directory(),
            success_directory: default_success_directory(),
            error_directory: default_error_directory(),
            worker_count: default_worker_count(),
            extraction: ExtractionConfig::default(),
            prompt_template: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Explicit interpreter path; skips the PATH search when set.
    #[serde(default)]
    pub interpreter: Option<String>,
    /// Executable names searched on PATH, in order.
    #[serde(default = "default_interpreter_candidates")]
    pub interpreter_candidates: Vec<String>,
    /// Per-file subprocess deadline in seconds. 0 disables the deadline.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub auto_install: bool,
}

fn default_interpreter_candidates() -> Vec<String> {
    vec!["python3".to_string(), "python".to_string()]
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            interpreter_candidates: default_interpreter_candidates(),
            timeout_secs: default_timeout_secs(),
            auto_install: true,
        }
    }
}
