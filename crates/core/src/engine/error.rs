//! Error types for the engine module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a transcoding engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// A configured binary ran but did not behave like ffmpeg.
    #[error("{path} is not usable: -version exited with code {code:?}")]
    BinaryUnusable { path: PathBuf, code: Option<i32> },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The engine could not read the input as media.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// The input has no video stream to crop.
    #[error("No video stream found in {path}")]
    NoVideoStream { path: PathBuf },

    /// The encode process failed.
    #[error("Encode failed: {reason}")]
    EncodeFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// An encode was requested without any outputs.
    #[error("Encode invocation declares no outputs")]
    NoOutputs,

    /// Failed to parse FFprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// I/O error while talking to the engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a new encode failed error with diagnostic output.
    pub fn encode_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::EncodeFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Diagnostic output captured from the engine, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::EncodeFailed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}
