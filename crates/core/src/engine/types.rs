//! Types exchanged with the transcoding engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stream-level information reported by the engine's metadata inspector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// File path.
    pub path: PathBuf,
    /// Container format (e.g., "mov", "matroska").
    pub format: String,
    /// Duration in seconds, when the container reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Video streams, in container order.
    pub video_streams: Vec<VideoStreamInfo>,
    /// Whether at least one audio stream is present.
    pub has_audio: bool,
    /// Codec of the first audio stream (e.g., "aac", "pcm_s16le").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
}

impl MediaInfo {
    /// The first video stream, which is the one ffmpeg picks by default.
    pub fn primary_video(&self) -> Option<&VideoStreamInfo> {
        self.video_streams.first()
    }
}

/// Information about one video stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    /// Codec name (e.g., "h264").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate in frames per second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    /// Total number of frames, when the container records it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u64>,
}

/// One output declared in a multi-output encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Destination file.
    pub path: PathBuf,
    /// Video filter chain, applied in order.
    pub filters: Vec<String>,
    /// Output options, emitted before the filter chain.
    pub options: Vec<String>,
}

/// A single engine invocation producing every declared output from one input.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeInvocation {
    /// Source media file.
    pub input: PathBuf,
    /// Outputs, in declaration order.
    pub outputs: Vec<OutputTarget>,
    /// Source duration used to compute progress percent.
    pub expected_duration_secs: Option<f64>,
    /// Source frame count, fallback for progress percent.
    pub expected_frames: Option<u64>,
}

/// Progress update emitted while an encode is running.
///
/// The engine reports one aggregate stream for the whole invocation, not one
/// stream per output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Frames encoded so far.
    pub frames: u64,
    /// Current encoding speed in frames per second.
    pub current_fps: f32,
    /// Overall completion (0.0 - 100.0).
    pub percent: f32,
    /// Position in the source, formatted as `HH:MM:SS.cc`.
    pub timemark: String,
}
