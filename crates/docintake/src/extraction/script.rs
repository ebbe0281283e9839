use std::io::Write;

use tempfile::NamedTempFile;

use crate::classifier::DocumentKind;
use crate::error::ExtractError;

const PDF_SCRIPT: &str = include_str!("../../scripts/extract_pdf.py");
const IMAGE_SCRIPT: &str = include_str!("../../scripts/extract_image.py");

/// A Python package an extraction script imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    /// Name passed to `pip install`.
    pub package: &'static str,
    module: Option<&'static str>,
}

impl Dependency {
    pub const fn new(package: &'static str) -> Self {
        Self {
            package,
            module: None,
        }
    }

    pub const fn with_module(package: &'static str, module: &'static str) -> Self {
        Self {
            package,
            module: Some(module),
        }
    }

    /// Name used in the `import` probe; the lowercased package name unless
    /// the package declares its own.
    pub fn module(&self) -> String {
        self.module
            .map(str::to_string)
            .unwrap_or_else(|| self.package.to_lowercase())
    }
}

const PDF_DEPENDENCIES: &[Dependency] = &[
    // The module is `PyPDF2`; a lowercased `import pypdf2` always fails and
    // would reinstall on every run.
    Dependency::with_module("PyPDF2", "PyPDF2"),
    Dependency::new("pdfplumber"),
];

const IMAGE_DEPENDENCIES: &[Dependency] = &[Dependency::new("pytesseract")];

pub fn dependencies(kind: DocumentKind) -> &'static [Dependency] {
    match kind {
        DocumentKind::Pdf => PDF_DEPENDENCIES,
        DocumentKind::Image => IMAGE_DEPENDENCIES,
    }
}

pub fn script_body(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Pdf => PDF_SCRIPT,
        DocumentKind::Image => IMAGE_SCRIPT,
    }
}

fn script_prefix(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Pdf => "pdf_extractor_",
        DocumentKind::Image => "image_extractor_",
    }
}

/// Writes the embedded script for `kind` to a uniquely named temp file.
/// The file is deleted when the returned handle drops.
pub fn materialize(kind: DocumentKind) -> Result<NamedTempFile, ExtractError> {
    let mut file = tempfile::Builder::new()
        .prefix(script_prefix(kind))
        .suffix(".py")
        .tempfile()
        .map_err(ExtractError::TempScript)?;

    file.write_all(script_body(kind).as_bytes())
        .map_err(ExtractError::TempScript)?;
    file.flush().map_err(ExtractError::TempScript)?;

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_speak_marker_protocol() {
        for kind in [DocumentKind::Pdf, DocumentKind::Image] {
            let body = script_body(kind);
            assert!(body.contains("JSON_RESULT_START"));
            assert!(body.contains("JSON_RESULT_END"));
        }
    }

    #[test]
    fn test_materialize_unique_and_removed_on_drop() {
        let first = materialize(DocumentKind::Pdf).unwrap();
        let second = materialize(DocumentKind::Pdf).unwrap();
        assert_ne!(first.path(), second.path());

        let name = first.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("pdf_extractor_"));
        assert!(name.ends_with(".py"));
        assert_eq!(
            std::fs::read_to_string(first.path()).unwrap(),
            script_body(DocumentKind::Pdf)
        );

        let path = first.path().to_path_buf();
        drop(first);
        assert!(!path.exists());
    }

    #[test]
    fn test_image_script_prefix() {
        let script = materialize(DocumentKind::Image).unwrap();
        let name = script.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("image_extractor_"));
    }

    #[test]
    fn test_dependency_modules() {
        let pdf: Vec<String> = dependencies(DocumentKind::Pdf)
            .iter()
            .map(|d| d.module())
            .collect();
        assert_eq!(pdf, vec!["PyPDF2".to_string(), "pdfplumber".to_string()]);

        let image = dependencies(DocumentKind::Image);
        assert_eq!(image.len(), 1);
        assert_eq!(image[0].package, "pytesseract");
        assert_eq!(image[0].module(), "pytesseract");
    }

    #[test]
    fn test_module_defaults_to_lowercase_package() {
        assert_eq!(Dependency::new("PyTesseract").module(), "pytesseract");
    }
}
