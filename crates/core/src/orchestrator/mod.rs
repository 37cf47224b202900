//! Multi-output encode orchestration.
//!
//! All renditions of a run are declared in one engine invocation so the
//! source is decoded once and shared across outputs. The run succeeds only if
//! the whole invocation succeeds.

mod job;

pub use job::{EncodeJob, EncodePlan};

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{EngineError, ProgressEvent, TranscodeEngine};

/// Callback invoked for every progress event, in arrival order.
pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Buffer size for the progress channel.
const PROGRESS_BUFFER: usize = 64;

/// The coordinated encode failed.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct EncodeError {
    /// Engine failure.
    #[source]
    pub source: EngineError,
    /// Outputs that exist on disk despite the failure.
    pub partial_outputs: Vec<PathBuf>,
}

/// Drives the engine through one encode plan.
pub struct EncodeOrchestrator<E: TranscodeEngine + ?Sized> {
    engine: Arc<E>,
}

impl<E: TranscodeEngine + ?Sized> EncodeOrchestrator<E> {
    /// Creates an orchestrator backed by the given engine.
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Runs every job of the plan in one engine invocation.
    ///
    /// Progress events are forwarded to `on_progress` unchanged; all of them
    /// have been delivered by the time this returns.
    pub async fn run(
        &self,
        plan: &EncodePlan,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<(), EncodeError> {
        let invocation = plan.invocation();
        debug!(
            engine = self.engine.name(),
            source = %plan.source.display(),
            outputs = plan.jobs.len(),
            "Running encode"
        );

        let result = match on_progress {
            Some(callback) => {
                let (tx, mut rx) = mpsc::channel::<ProgressEvent>(PROGRESS_BUFFER);

                let forward = async move {
                    let mut forwarded = 0usize;
                    while let Some(event) = rx.recv().await {
                        callback(&event);
                        forwarded += 1;
                    }
                    forwarded
                };

                let (result, forwarded) =
                    tokio::join!(self.engine.encode(&invocation, Some(tx)), forward);
                debug!(events = forwarded, "Progress stream closed");
                result
            }
            None => self.engine.encode(&invocation, None).await,
        };

        result.map_err(|source| {
            let partial_outputs: Vec<PathBuf> = plan
                .output_paths()
                .into_iter()
                .filter(|p| p.exists())
                .collect();
            warn!(
                error = %source,
                partial_outputs = partial_outputs.len(),
                "Encode failed"
            );
            EncodeError {
                source,
                partial_outputs,
            }
        })
    }
}
