use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let directories = [
        ("intake_directory", &config.intake_directory),
        ("success_directory", &config.success_directory),
        ("error_directory", &config.error_directory),
    ];

    for (name, value) in &directories {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("{} must not be empty", name),
            });
        }
    }

    // Terminal directories must not alias the intake directory or each other
    for (i, (name_a, a)) in directories.iter().enumerate() {
        for (name_b, b) in directories.iter().skip(i + 1) {
            if Path::new(a.as_str()) == Path::new(b.as_str()) {
                return Err(ConfigError::Validation {
                    message: format!("{} and {} must differ (both '{}')", name_a, name_b, a),
                });
            }
        }
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }

    let extraction = &config.extraction;
    if extraction.interpreter.is_none() && extraction.interpreter_candidates.is_empty() {
        return Err(ConfigError::Validation {
            message: "interpreter_candidates must not be empty when no interpreter is set"
                .to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_empty_object_uses_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config.intake_directory, "./learning/to-process");
        assert_eq!(config.success_directory, "./learning/success");
        assert_eq!(config.error_directory, "./learning/error");
        assert_eq!(config.worker_count, 1);
        assert_eq!(
            config.extraction.interpreter_candidates,
            vec!["python3".to_string(), "python".to_string()]
        );
        assert_eq!(config.extraction.timeout_secs, 300);
        assert!(config.extraction.auto_install);
        assert!(config.prompt_template.is_none());
    }

    #[test]
    fn test_load_valid_config() {
        let config_json = r#"
        {
            "intake_directory": "/data/in",
            "success_directory": "/data/ok",
            "error_directory": "/data/failed",
            "worker_count": 4,
            "extraction": {
                "interpreter": "/usr/bin/python3",
                "timeout_secs": 60,
                "auto_install": false
            },
            "prompt_template": "/etc/docintake/prompt.md"
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.intake_directory, "/data/in");
        assert_eq!(config.worker_count, 4);
        assert_eq!(
            config.extraction.interpreter.as_deref(),
            Some("/usr/bin/python3")
        );
        assert_eq!(config.extraction.timeout_secs, 60);
        assert!(!config.extraction.auto_install);
        assert_eq!(
            config.prompt_template.as_deref(),
            Some("/etc/docintake/prompt.md")
        );
    }

    #[test]
    fn test_identical_directories_rejected() {
        let config_json = r#"
        {
            "intake_directory": "/data/in",
            "success_directory": "/data/in",
            "error_directory": "/data/failed"
        }
        "#;

        match load_config_from_str(config_json) {
            Err(ConfigError::Validation { message }) => {
                assert!(message.contains("intake_directory"));
                assert!(message.contains("success_directory"));
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = load_config_from_str(r#"{ "worker_count": 0 }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_empty_directory_rejected() {
        let result = load_config_from_str(r#"{ "error_directory": "  " }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_no_interpreter_source_rejected() {
        let result = load_config_from_str(r#"{ "extraction": { "interpreter_candidates": [] } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/docintake.json");
        match result {
            Err(ConfigError::ReadFile { path, .. }) => {
                assert!(path.ends_with("docintake.json"));
            }
            other => panic!("Expected ReadFile error, got {:?}", other),
        }
    }
}
