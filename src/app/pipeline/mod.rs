// Clip extraction pipeline - resolve, build, execute as one operation

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::app::command_builder::ClipCommandBuilder;
use crate::domain::errors::PipelineError;
use crate::domain::model::{ClipCommand, ClipDescriptor, ClipWindow};
use crate::ports::{ClipExecutor, SourceResolver};

/// Where an extraction currently is. Each stage carries only its own data.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    Idle,
    Resolving { source_uri: String },
    Building { input_path: String, window: ClipWindow },
    Executing { command: ClipCommand },
    Done { descriptor: ClipDescriptor },
    Failed { error: PipelineError },
}

impl PipelineStage {
    /// True while an extraction is running
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PipelineStage::Resolving { .. }
                | PipelineStage::Building { .. }
                | PipelineStage::Executing { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Resolving { .. } => "resolving",
            PipelineStage::Building { .. } => "building",
            PipelineStage::Executing { .. } => "executing",
            PipelineStage::Done { .. } => "done",
            PipelineStage::Failed { .. } => "failed",
        }
    }
}

/// Turns a source locator and a window into a finished clip file.
///
/// Stages run strictly in order and the first failure ends the attempt. The
/// pipeline never touches the catalog.
pub struct ClipExtractionPipeline {
    resolver: Arc<dyn SourceResolver>,
    builder: ClipCommandBuilder,
    executor: Arc<dyn ClipExecutor>,
    destination_dir: PathBuf,
    stage: watch::Sender<PipelineStage>,
}

impl ClipExtractionPipeline {
    pub fn new(
        resolver: Arc<dyn SourceResolver>,
        builder: ClipCommandBuilder,
        executor: Arc<dyn ClipExecutor>,
        destination_dir: impl Into<PathBuf>,
    ) -> Self {
        let (stage, _) = watch::channel(PipelineStage::Idle);
        Self {
            resolver,
            builder,
            executor,
            destination_dir: destination_dir.into(),
            stage,
        }
    }

    /// Observe stage changes, e.g. to show a processing indicator
    pub fn subscribe(&self) -> watch::Receiver<PipelineStage> {
        self.stage.subscribe()
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage.borrow().clone()
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    fn enter(&self, stage: PipelineStage) {
        info!("Extraction stage: {}", stage.name());
        self.stage.send_replace(stage);
    }

    fn fail(&self, error: PipelineError) -> PipelineError {
        warn!("Extraction failed: {}", error);
        self.stage.send_replace(PipelineStage::Failed {
            error: error.clone(),
        });
        error
    }

    /// Extract `window` from `source_uri`
    pub async fn extract(
        &self,
        source_uri: &str,
        window: ClipWindow,
    ) -> Result<ClipDescriptor, PipelineError> {
        self.enter(PipelineStage::Resolving {
            source_uri: source_uri.to_string(),
        });
        let input_path = self
            .resolver
            .resolve(source_uri)
            .await
            .map_err(|e| self.fail(e.into()))?;

        self.enter(PipelineStage::Building {
            input_path: input_path.clone(),
            window,
        });
        let command = self
            .builder
            .build(&input_path, &window, &self.destination_dir)
            .map_err(|e| self.fail(e.into()))?;

        self.enter(PipelineStage::Executing {
            command: command.clone(),
        });
        let report = match self.executor.execute(&command).await {
            Ok(report) => report,
            Err(details) => {
                remove_partial_output(&command.output_path).await;
                return Err(self.fail(details.into()));
            }
        };

        let start = window.start.max(0.0);
        let descriptor = ClipDescriptor {
            output_path: report.output_path,
            start,
            end: start + window.duration,
        };
        self.enter(PipelineStage::Done {
            descriptor: descriptor.clone(),
        });
        Ok(descriptor)
    }
}

/// Delete whatever a failed run left behind
async fn remove_partial_output(output_path: &str) {
    match tokio::fs::remove_file(output_path).await {
        Ok(()) => info!("Removed partial output {}", output_path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial output {}: {}", output_path, e),
    }
}
