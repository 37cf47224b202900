//! Pipeline stages and errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::orchestrator::EncodeError;
use crate::packager::PackageError;
use crate::probe::ProbeError;

/// Position of a run in the pipeline.
///
/// Runs move strictly forward: `Start`, `Probing`, `Naming`, `Encoding`,
/// `Packaging`, then `Done`. Any failure moves the run to `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    Probing,
    Naming,
    Encoding,
    Packaging,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Start => "start",
            Stage::Probing => "probing",
            Stage::Naming => "naming",
            Stage::Encoding => "encoding",
            Stage::Packaging => "packaging",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
        };
        write!(f, "{}", s)
    }
}

/// Error type for pipeline runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input is not decodable video.
    #[error("Probe failed: {0}")]
    Probe(#[from] ProbeError),

    /// The coordinated encode failed.
    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// The archive could not be written.
    #[error("Packaging failed: {0}")]
    Package(#[from] PackageError),

    /// The scratch workspace could not be created.
    #[error("Failed to create workspace {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input path cannot be named.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    /// Stage the run was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Probe(_) => Stage::Probing,
            PipelineError::InvalidInput(_) | PipelineError::Workspace { .. } => Stage::Naming,
            PipelineError::Encode(_) => Stage::Encoding,
            PipelineError::Package(_) => Stage::Packaging,
        }
    }

    /// Engine diagnostic output, if the failure produced any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            PipelineError::Encode(e) => e.source.diagnostics(),
            _ => None,
        }
    }
}
