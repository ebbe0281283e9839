mod cli;

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use docintake::config::Config;
use docintake::pipeline::{BatchSummary, LogProgress, Pipeline, PipelineConfig};
use docintake::{ConfigError, DocintakeError, DocumentKind, ExtractionCache, ExtractionClient};

use cli::{Cli, Command};

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(#[from] DocintakeError),
    #[error("failed to write summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("{failed} of {total} dependency groups are not available")]
    Dependencies { failed: usize, total: usize },
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::Pipeline(DocintakeError::Config(_)) => 2,
            _ => 1,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(err) = run(cli) {
        error!("{}", err);
        eprintln!("{err}");
        process::exit(err.exit_code());
    }
}

/// Installs the fmt subscriber (`RUST_LOG` overrides the `info` default) and
/// forwards `log` records into it.
fn init_tracing(json: bool) {
    if tracing_log::LogTracer::init().is_err() {
        eprintln!("Log bridge already set; skipping.");
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    if result.is_err() {
        eprintln!("Tracing subscriber already set; skipping re-initialization.");
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = cli.resolve_config()?;
    info!("Starting docintake v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Run { json } => {
            let pipeline = build_pipeline(&config)?;
            let summary = pipeline.run_batch(&LogProgress)?;
            print_summary(&summary, json)?;
        }
        Command::Watch => run_watch(&config)?,
        Command::Deps { check } => run_deps(&config, check)?,
    }

    Ok(())
}

fn build_pipeline(config: &Config) -> Result<Pipeline, AppError> {
    let pipeline_config = Arc::new(PipelineConfig::from_config(config));
    let cache = Arc::new(ExtractionCache::new());
    Ok(Pipeline::from_config(pipeline_config, cache)?)
}

fn print_summary(summary: &BatchSummary, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("Success: {}", summary.successes);
    println!("Errors:  {}", summary.errors);
    println!("Total:   {}", summary.total);
    if summary.routing_failures > 0 {
        println!("Not moved: {}", summary.routing_failures);
    }
    Ok(())
}

fn run_watch(config: &Config) -> Result<(), AppError> {
    let pipeline = build_pipeline(config)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_flag.store(true, Ordering::SeqCst);
    })?;

    // Files already waiting are handled before watching starts
    let summary = pipeline.run_batch(&LogProgress)?;
    print_summary(&summary, false)?;

    pipeline.scanner().watch(
        |_changed| {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            match pipeline.run_batch(&LogProgress) {
                Ok(summary) if !summary.is_empty() => {
                    if let Err(e) = print_summary(&summary, false) {
                        warn!("{}", e);
                    }
                }
                Ok(_) => {}
                Err(e) => error!("Batch run failed: {}", e),
            }
        },
        Arc::clone(&shutdown),
    )
    .map_err(DocintakeError::from)?;

    Ok(())
}

fn run_deps(config: &Config, check_only: bool) -> Result<(), AppError> {
    let client = ExtractionClient::from_config(&config.extraction, Arc::new(ExtractionCache::new()))
        .map_err(DocintakeError::from)?
        .with_auto_install(config.extraction.auto_install && !check_only);

    println!("Interpreter: {}", client.interpreter().display());

    let kinds = [DocumentKind::Pdf, DocumentKind::Image];
    let mut failed = 0;
    for kind in kinds {
        match client.ensure_dependencies(kind) {
            Ok(()) => println!("{}: ok", kind),
            Err(e) => {
                println!("{}: {}", kind, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(AppError::Dependencies {
            failed,
            total: kinds.len(),
        });
    }
    Ok(())
}
