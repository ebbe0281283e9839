//! Turns extracted text into the prompt handed to the downstream consumer.

use std::path::Path;

use crate::error::ConfigError;

const DEFAULT_TEMPLATE: &str = include_str!("../../prompts/ocr.prompt.md");

/// Placeholder replaced by the extracted text.
pub const RAW_TEXT_PLACEHOLDER: &str = "{{raw_text}}";

pub trait PromptRenderer: Send + Sync {
    fn render(&self, raw_text: &str) -> String;
}

/// Renders by substituting [`RAW_TEXT_PLACEHOLDER`] in a template.
#[derive(Debug, Clone)]
pub struct TemplatePrompt {
    template: String,
}

impl Default for TemplatePrompt {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl TemplatePrompt {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        if !template.contains(RAW_TEXT_PLACEHOLDER) {
            log::warn!(
                "Prompt template {} has no {} placeholder",
                path.display(),
                RAW_TEXT_PLACEHOLDER
            );
        }

        Ok(Self::new(template))
    }

    /// Template file when one is configured, otherwise the built-in one.
    pub fn from_config(template_path: Option<&str>) -> Result<Self, ConfigError> {
        match template_path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl PromptRenderer for TemplatePrompt {
    fn render(&self, raw_text: &str) -> String {
        self.template.replace(RAW_TEXT_PLACEHOLDER, raw_text)
    }
}
