use std::path::PathBuf;

use clap::{Parser, Subcommand};

use docintake::config::{load_config, validate_config, Config};
use docintake::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "docintake", author, version, about)]
pub struct Cli {
    /// JSON config file. Built-in defaults are used when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory scanned for new documents.
    #[arg(long, global = true)]
    pub intake: Option<PathBuf>,

    /// Directory receiving successfully processed files.
    #[arg(long, global = true)]
    pub success: Option<PathBuf>,

    /// Directory receiving rejected or failed files.
    #[arg(long, global = true)]
    pub error: Option<PathBuf>,

    /// Number of files processed in parallel.
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Per-file extraction deadline in seconds (0 disables it).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Interpreter executable, skipping the PATH search.
    #[arg(long, global = true)]
    pub interpreter: Option<String>,

    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process every file currently in the intake directory.
    Run {
        /// Print the batch summary as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
    /// Process the intake directory, then keep processing as files arrive.
    Watch,
    /// Check, and unless --check is given install, interpreter dependencies.
    Deps {
        /// Only report missing dependencies.
        #[arg(long)]
        check: bool,
    },
}

impl Cli {
    /// Loads the config file (or defaults), applies flag overrides and
    /// validates the result.
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };

        if let Some(intake) = &self.intake {
            config.intake_directory = intake.to_string_lossy().into_owned();
        }
        if let Some(success) = &self.success {
            config.success_directory = success.to_string_lossy().into_owned();
        }
        if let Some(error) = &self.error {
            config.error_directory = error.to_string_lossy().into_owned();
        }
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(timeout) = self.timeout {
            config.extraction.timeout_secs = timeout;
        }
        if let Some(interpreter) = &self.interpreter {
            config.extraction.interpreter = Some(interpreter.clone());
        }

        validate_config(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_without_config_file() {
        let cli = Cli::parse_from(["docintake", "run"]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.intake_directory, "./learning/to-process");
        assert_eq!(config.worker_count, 1);
        assert!(matches!(cli.command, Command::Run { json: false }));
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "docintake",
            "--intake",
            "/data/in",
            "--success",
            "/data/ok",
            "--error",
            "/data/failed",
            "--workers",
            "4",
            "--timeout",
            "30",
            "run",
            "--json",
        ]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.intake_directory, "/data/in");
        assert_eq!(config.success_directory, "/data/ok");
        assert_eq!(config.error_directory, "/data/failed");
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.extraction.timeout_secs, 30);
        assert!(matches!(cli.command, Command::Run { json: true }));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = Cli::parse_from(["docintake", "--workers", "0", "watch"]);
        assert!(matches!(
            cli.resolve_config(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_deps_check_flag() {
        let cli = Cli::parse_from(["docintake", "deps", "--check"]);
        assert!(matches!(cli.command, Command::Deps { check: true }));
    }
}
