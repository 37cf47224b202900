//! Engine module: the boundary to the external transcoder.
//!
//! The `TranscodeEngine` trait is the seam between the rendition pipeline and
//! the program that actually decodes and encodes pixels. `FfmpegEngine` drives
//! `ffprobe` for metadata and a single multi-output `ffmpeg` process for
//! encoding, parsing its `-progress` stream into [`ProgressEvent`]s.
//!
//! # Example
//!
//! ```ignore
//! use shrinkray_core::engine::{EngineConfig, FfmpegEngine, TranscodeEngine};
//!
//! let engine = FfmpegEngine::new(EngineConfig::default());
//! engine.validate().await?;
//!
//! let info = engine.probe(Path::new("/media/clip.mp4")).await?;
//! println!("{} video stream(s)", info.video_streams.len());
//! ```

mod config;
mod error;
mod ffmpeg;
mod progress;
mod traits;
mod types;

pub use config::EngineConfig;
pub use error::EngineError;
pub use ffmpeg::FfmpegEngine;
pub use progress::{format_timemark, ProgressParser};
pub use traits::TranscodeEngine;
pub use types::{EncodeInvocation, MediaInfo, OutputTarget, ProgressEvent, VideoStreamInfo};
