//! Fail-fast media validation.
//!
//! Probing is the gate in front of every encode: the source must be readable
//! by the engine and must carry at least one video stream, or the run stops
//! before any workspace or encode exists.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::engine::{EngineError, MediaInfo, TranscodeEngine};

/// Input file that passed probing, with the attributes the engine reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMedia {
    /// Input path, owned by the caller.
    pub path: PathBuf,
    /// Width of the primary video stream.
    pub width: u32,
    /// Height of the primary video stream.
    pub height: u32,
    /// Frame rate of the primary video stream.
    pub frame_rate: Option<f64>,
    /// Frame count of the primary video stream.
    pub frame_count: Option<u64>,
    /// Container duration in seconds.
    pub duration_secs: Option<f64>,
    /// Whether the source carries audio.
    pub has_audio: bool,
    /// Codec of the first audio stream.
    pub audio_codec: Option<String>,
}

/// The input could not be validated as video.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProbeError {
    /// Input that failed.
    pub path: PathBuf,
    /// Engine diagnostic.
    pub message: String,
}

impl ProbeError {
    fn from_engine(path: &Path, err: EngineError) -> Self {
        let message = match err {
            EngineError::ProbeFailed { reason } => reason,
            other => other.to_string(),
        };
        Self {
            path: path.to_path_buf(),
            message,
        }
    }
}

/// Validates inputs through the engine's metadata inspector.
pub struct MediaProbe<E: TranscodeEngine + ?Sized> {
    engine: Arc<E>,
}

impl<E: TranscodeEngine + ?Sized> MediaProbe<E> {
    /// Creates a probe backed by the given engine.
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Probes `path` and returns its metadata if it is decodable video.
    pub async fn probe(&self, path: &Path) -> Result<SourceMedia, ProbeError> {
        let info = self
            .engine
            .probe(path)
            .await
            .map_err(|e| ProbeError::from_engine(path, e))?;

        debug!(
            path = %path.display(),
            format = %info.format,
            video_streams = info.video_streams.len(),
            "Probed source"
        );

        source_from_info(info)
    }
}

fn source_from_info(info: MediaInfo) -> Result<SourceMedia, ProbeError> {
    let Some(video) = info.primary_video().cloned() else {
        return Err(ProbeError::from_engine(
            &info.path,
            EngineError::NoVideoStream {
                path: info.path.clone(),
            },
        ));
    };

    Ok(SourceMedia {
        path: info.path,
        width: video.width,
        height: video.height,
        frame_rate: video.frame_rate,
        frame_count: video.frame_count,
        duration_secs: info.duration_secs,
        has_audio: info.has_audio,
        audio_codec: info.audio_codec,
    })
}
