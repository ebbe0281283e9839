use std::path::PathBuf;

use crate::config::{Config, ExtractionConfig};

pub struct PipelineConfig {
    pub intake_directory: PathBuf,
    pub success_directory: PathBuf,
    pub error_directory: PathBuf,
    pub worker_count: usize,
    pub extraction: ExtractionConfig,
    pub prompt_template: Option<String>,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            intake_directory: PathBuf::from(&config.intake_directory),
            success_directory: PathBuf::from(&config.success_directory),
            error_directory: PathBuf::from(&config.error_directory),
            worker_count: config.worker_count.max(1),
            extraction: config.extraction.clone(),
            prompt_template: config.prompt_template.clone(),
        }
    }
}
