use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};
use tracing::info_span;

use crate::classifier::{self, DocumentKind};
use crate::error::DocintakeError;
use crate::extraction::{ExtractionCache, ExtractionClient};
use crate::prompt::{PromptRenderer, TemplatePrompt};
use crate::sanitize;
use crate::storage::{Destination, FileRouter};
use crate::worker::{DirectoryScanner, FileReport, FileTask, RoutingOutcome};

use super::config::PipelineConfig;
use super::context::TaskContext;
use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter, TaskPhase};
use super::summary::BatchSummary;

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    client: ExtractionClient,
    router: FileRouter,
    renderer: Box<dyn PromptRenderer>,
}

impl Pipeline {
    /// Production constructor. Fails when no interpreter can be located, the
    /// prompt template cannot be read or the terminal directories cannot be
    /// created.
    pub fn from_config(
        config: Arc<PipelineConfig>,
        cache: Arc<ExtractionCache>,
    ) -> Result<Self, DocintakeError> {
        let client = ExtractionClient::from_config(&config.extraction, cache)?;
        let renderer = TemplatePrompt::from_config(config.prompt_template.as_deref())?;
        let router = FileRouter::new(&config.success_directory, &config.error_directory);

        Self::new(config, client, router, Box::new(renderer))
    }

    /// Builds a pipeline from already constructed components.
    pub fn new(
        config: Arc<PipelineConfig>,
        client: ExtractionClient,
        router: FileRouter,
        renderer: Box<dyn PromptRenderer>,
    ) -> Result<Self, DocintakeError> {
        router.ensure_directories()?;

        Ok(Self {
            config,
            client,
            router,
            renderer,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn client(&self) -> &ExtractionClient {
        &self.client
    }

    /// Scanner over the intake directory that skips the terminal directories.
    pub fn scanner(&self) -> DirectoryScanner {
        DirectoryScanner::new(&self.config.intake_directory)
            .with_excluded([&self.config.success_directory, &self.config.error_directory])
    }

    /// Scans the intake directory and processes every file found.
    ///
    /// Only a failure to read the intake directory itself is an error;
    /// per-file failures end up in the summary.
    pub fn run_batch(
        &self,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchSummary, DocintakeError> {
        let _batch_span = info_span!("batch",
            intake = %self.config.intake_directory.display(),
            workers = self.config.worker_count,
        )
        .entered();

        let paths = self.scanner().scan()?;
        Ok(self.process_paths(paths, progress))
    }

    /// Processes `paths` in order, or across `worker_count` threads when more
    /// than one worker is configured. Reports keep the order of `paths`.
    pub fn process_paths(
        &self,
        paths: Vec<PathBuf>,
        progress: &dyn ProgressReporter,
    ) -> BatchSummary {
        let reports = if self.config.worker_count <= 1 || paths.len() <= 1 {
            paths
                .into_iter()
                .map(|path| self.process_file(path, progress))
                .collect()
        } else {
            self.process_parallel(paths, progress)
        };

        let summary = BatchSummary::from_reports(reports);
        info!(
            "Processing completed: {} success, {} errors, {} total",
            summary.successes, summary.errors, summary.total
        );
        if summary.routing_failures > 0 {
            info!("{} files could not be moved", summary.routing_failures);
        }
        for entry in self.client.cache().summaries() {
            debug!(
                "Cached {} ({} characters): {}",
                entry.filename, entry.char_count, entry.preview
            );
        }
        summary
    }

    fn process_parallel(
        &self,
        paths: Vec<PathBuf>,
        progress: &dyn ProgressReporter,
    ) -> Vec<FileReport> {
        let workers = self.config.worker_count.min(paths.len());
        let (task_tx, task_rx) = crossbeam_channel::bounded::<(usize, PathBuf)>(workers);
        let (report_tx, report_rx) = crossbeam_channel::unbounded::<(usize, FileReport)>();

        std::thread::scope(|scope| {
            for worker_id in 0..workers {
                let task_rx = task_rx.clone();
                let report_tx = report_tx.clone();
                scope.spawn(move || {
                    debug!("Worker {} started", worker_id);
                    for (index, path) in task_rx.iter() {
                        let report = self.process_file(path, progress);
                        if report_tx.send((index, report)).is_err() {
                            break;
                        }
                    }
                    debug!("Worker {} finished", worker_id);
                });
            }
            drop(report_tx);

            for item in paths.into_iter().enumerate() {
                if task_tx.send(item).is_err() {
                    break;
                }
            }
            drop(task_tx);
        });

        let mut indexed: Vec<(usize, FileReport)> = report_rx.iter().collect();
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, report)| report).collect()
    }

    /// Runs one file through the pipeline and routes it.
    pub fn process_file(&self, path: PathBuf, progress: &dyn ProgressReporter) -> FileReport {
        let ctx = TaskContext::new(FileTask::new(path));
        let (report, _ctx) = self.run(ctx, progress);
        report
    }

    /// Runs classify → dependencies → extract → prompt for one file, then
    /// moves it to the success or error directory.
    /// Returns a (FileReport, TaskContext) pair.
    pub fn run(
        &self,
        mut ctx: TaskContext,
        progress: &dyn ProgressReporter,
    ) -> (FileReport, TaskContext) {
        let filename = sanitize::redact_path(&ctx.task.path);
        let _pipeline_span = info_span!("pipeline",
            task_id = %ctx.task.short_id(),
            filename = %filename,
        )
        .entered();

        progress.report(ProgressEvent::Started {
            task_id: ctx.task.id.clone(),
            filename: filename.clone(),
        });

        let report = match self.process(&mut ctx, progress) {
            Ok(()) => self.success_report(&ctx),
            Err(e) => {
                let error = e.to_string();
                progress.report(ProgressEvent::Failed {
                    task_id: ctx.task.id.clone(),
                    filename: filename.clone(),
                    error: error.clone(),
                });
                FileReport::failure(&ctx.task, error)
            }
        };

        let outcome = {
            let _step = info_span!("route").entered();
            self.phase(&ctx, TaskPhase::Routing, progress);
            self.step_route(&ctx, report.success)
        };

        match &outcome {
            RoutingOutcome::MoveFailed(error) => {
                progress.report(ProgressEvent::RouteFailed {
                    task_id: ctx.task.id.clone(),
                    filename,
                    error: error.clone(),
                });
            }
            RoutingOutcome::Success(destination) => {
                progress.report(ProgressEvent::Completed {
                    task_id: ctx.task.id.clone(),
                    filename,
                    destination: destination.clone(),
                    char_count: report.char_count,
                });
            }
            RoutingOutcome::Error(_) => {}
        }

        let report = report.with_routing(&outcome);
        ctx.task.outcome = Some(outcome);
        (report, ctx)
    }

    fn process(
        &self,
        ctx: &mut TaskContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        // Step 1: Classify
        let kind = {
            let _step = info_span!("classify").entered();
            self.phase(ctx, TaskPhase::Classifying, progress);
            self.step_classify(ctx)?
        };

        // Step 2: Ensure interpreter dependencies
        {
            let _step = info_span!("ensure_dependencies", kind = %kind).entered();
            self.phase(ctx, TaskPhase::CheckingDependencies, progress);
            self.step_ensure_dependencies(kind)?;
        }

        // Step 3: Extract
        {
            self.phase(ctx, TaskPhase::Extracting, progress);
            self.step_extract(ctx, kind)?;
        }

        // Step 4: Render prompt
        {
            let _step = info_span!("render_prompt").entered();
            self.phase(ctx, TaskPhase::RenderingPrompt, progress);
            self.step_render_prompt(ctx);
        }

        Ok(())
    }

    fn phase(&self, ctx: &TaskContext, phase: TaskPhase, progress: &dyn ProgressReporter) {
        progress.report(ProgressEvent::Phase {
            task_id: ctx.task.id.clone(),
            phase,
        });
    }

    fn step_classify(&self, ctx: &mut TaskContext) -> Result<DocumentKind, PipelineError> {
        let kind = classifier::classify(&ctx.task.path)?;
        ctx.task.kind = Some(kind);
        Ok(kind)
    }

    fn step_ensure_dependencies(&self, kind: DocumentKind) -> Result<(), PipelineError> {
        self.client
            .ensure_dependencies(kind)
            .map_err(PipelineError::Dependencies)
    }

    fn step_extract(&self, ctx: &mut TaskContext, kind: DocumentKind) -> Result<(), PipelineError> {
        let result = self.client.extract(&ctx.task.path, kind);
        if !result.success {
            return Err(PipelineError::Extraction(result.error));
        }

        debug!(
            "Extracted {} characters from {} pages",
            result.text.chars().count(),
            result.page_count
        );
        ctx.extraction = Some(result);
        Ok(())
    }

    fn step_render_prompt(&self, ctx: &mut TaskContext) {
        if let Some(extraction) = &ctx.extraction {
            ctx.prompt = Some(self.renderer.render(&extraction.text));
        }
    }

    fn step_route(&self, ctx: &TaskContext, success: bool) -> RoutingOutcome {
        let destination = if success {
            Destination::Success
        } else {
            Destination::Error
        };

        match self.router.route(&ctx.task.path, destination) {
            Ok(path) if success => RoutingOutcome::Success(path),
            Ok(path) => RoutingOutcome::Error(path),
            Err(e) => RoutingOutcome::MoveFailed(e.to_string()),
        }
    }

    fn success_report(&self, ctx: &TaskContext) -> FileReport {
        let (page_count, char_count) = ctx
            .extraction
            .as_ref()
            .map(|r| (r.page_count, r.text.chars().count()))
            .unwrap_or_default();
        FileReport::success(
            &ctx.task,
            page_count,
            char_count,
            ctx.prompt.clone().unwrap_or_default(),
        )
    }
}
