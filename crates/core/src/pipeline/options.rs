//! Per-run options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::engine::ProgressEvent;
use crate::orchestrator::ProgressCallback;

/// Sink for human-readable run messages.
///
/// Separate from `tracing`: the caller decides where these go.
#[derive(Clone, Default)]
pub enum Logger {
    /// Messages are dropped.
    Disabled,
    /// Messages are printed to stdout, one per line.
    #[default]
    Default,
    /// Messages are handed to a callback.
    Custom(Arc<dyn Fn(&str) + Send + Sync>),
}

impl Logger {
    /// Creates a logger that forwards messages to `sink`.
    pub fn custom(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Logger::Custom(Arc::new(sink))
    }

    /// Emits one message.
    pub fn log(&self, message: &str) {
        let stdout = io::stdout();
        if let Err(e) = self.log_to(message, &mut stdout.lock()) {
            warn!(error = %e, "Failed to write log message");
        }
    }

    fn log_to(&self, message: &str, out: &mut impl Write) -> io::Result<()> {
        match self {
            Logger::Disabled => Ok(()),
            Logger::Default => writeln!(out, "{}", message),
            Logger::Custom(sink) => {
                sink(message);
                Ok(())
            }
        }
    }
}

impl From<bool> for Logger {
    fn from(enabled: bool) -> Self {
        if enabled {
            Logger::Default
        } else {
            Logger::Disabled
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logger::Disabled => write!(f, "Logger::Disabled"),
            Logger::Default => write!(f, "Logger::Default"),
            Logger::Custom(_) => write!(f, "Logger::Custom(..)"),
        }
    }
}

/// Options for one pipeline run.
#[derive(Clone, Default)]
pub struct PipelineOptions {
    /// Where the completion message goes.
    pub logger: Logger,
    /// Receives encode progress.
    pub on_progress: Option<ProgressCallback>,
    /// Copy source audio into every rendition instead of dropping it.
    pub retain_audio: bool,
    /// Project id to use instead of a generated one.
    pub project_id: Option<String>,
}

impl PipelineOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logger.
    pub fn with_logger(mut self, logger: impl Into<Logger>) -> Self {
        self.logger = logger.into();
        self
    }

    /// Sets the progress callback.
    pub fn with_progress(
        mut self,
        on_progress: impl Fn(&ProgressEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    /// Keeps or drops source audio.
    pub fn with_retain_audio(mut self, retain_audio: bool) -> Self {
        self.retain_audio = retain_audio;
        self
    }

    /// Forces the project id.
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("logger", &self.logger)
            .field("on_progress", &self.on_progress.is_some())
            .field("retain_audio", &self.retain_audio)
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Path of the written archive.
    pub archive_path: PathBuf,
    /// Project id of the run.
    pub project_id: String,
    /// Sanitized base name shared by every output.
    pub base_name: String,
    /// Archive entries in ordinal order.
    pub renditions: Vec<String>,
    /// Archive size in bytes.
    pub archive_bytes: u64,
}
