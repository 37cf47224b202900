//! FFmpeg-based engine implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::config::EngineConfig;
use super::error::EngineError;
use super::progress::ProgressParser;
use super::traits::TranscodeEngine;
use super::types::{EncodeInvocation, MediaInfo, ProgressEvent, VideoStreamInfo};

/// Number of diagnostic lines kept for error reports.
const DIAGNOSTIC_TAIL_LINES: usize = 32;

/// FFmpeg-based engine implementation.
pub struct FfmpegEngine {
    config: EngineConfig,
}

impl FfmpegEngine {
    /// Creates a new FFmpeg engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Creates an engine that finds ffmpeg and ffprobe on `PATH`.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds ffmpeg arguments declaring every output of the invocation.
    ///
    /// ffmpeg applies output options to the next output path, so each target
    /// carries its full option set followed by its filter chain and path.
    pub(crate) fn build_encode_args(&self, invocation: &EncodeInvocation) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-nostats".to_string(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ];

        args.extend(self.config.extra_args.iter().cloned());

        args.extend([
            "-i".to_string(),
            invocation.input.to_string_lossy().to_string(),
        ]);

        for output in &invocation.outputs {
            args.extend(output.options.iter().cloned());
            if !output.filters.is_empty() {
                args.extend(["-vf".to_string(), output.filters.join(",")]);
            }
            args.push(output.path.to_string_lossy().to_string());
        }

        args
    }

    /// Builds ffprobe arguments for a JSON metadata dump.
    fn build_probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_error".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    /// Picks the most useful message out of a failed ffprobe run.
    ///
    /// Raw error output wins; otherwise the structured `error.string`
    /// diagnostic that `-show_error` writes to stdout is used.
    pub(crate) fn extract_probe_error(stdout: &str, stderr: &str) -> Option<String> {
        #[derive(Deserialize)]
        struct ErrorEnvelope {
            error: ProbeErrorBody,
        }

        #[derive(Deserialize)]
        struct ProbeErrorBody {
            string: String,
        }

        let stderr = stderr.trim();
        if !stderr.is_empty() {
            return Some(stderr.to_string());
        }

        serde_json::from_str::<ErrorEnvelope>(stdout)
            .ok()
            .map(|envelope| envelope.error.string)
            .filter(|msg| !msg.trim().is_empty())
    }

    /// Parses ffprobe JSON output into MediaInfo.
    pub(crate) fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, EngineError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: Option<ProbeFormat>,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: Option<String>,
            duration: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
            avg_frame_rate: Option<String>,
            nb_frames: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| EngineError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let format = probe.format.as_ref();

        let duration_secs = format
            .and_then(|f| f.duration.as_ref())
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0);

        let format_name = format
            .and_then(|f| f.format_name.as_deref())
            .and_then(|name| name.split(',').next())
            .unwrap_or("unknown")
            .to_string();

        let video_streams = probe
            .streams
            .iter()
            .filter(|s| s.codec_type.as_deref() == Some("video"))
            .filter_map(|s| {
                Some(VideoStreamInfo {
                    codec: s.codec_name.clone(),
                    width: s.width?,
                    height: s.height?,
                    frame_rate: s
                        .avg_frame_rate
                        .as_deref()
                        .and_then(parse_frame_rate)
                        .or_else(|| s.r_frame_rate.as_deref().and_then(parse_frame_rate)),
                    frame_count: s
                        .nb_frames
                        .as_ref()
                        .and_then(|n| n.parse::<u64>().ok())
                        .filter(|n| *n > 0),
                })
            })
            .collect();

        let audio = probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"));

        Ok(MediaInfo {
            path: path.to_path_buf(),
            format: format_name,
            duration_secs,
            video_streams,
            has_audio: audio.is_some(),
            audio_codec: audio.and_then(|s| s.codec_name.clone()),
        })
    }

    fn spawn_error(&self, e: std::io::Error, ffprobe: bool) -> EngineError {
        if e.kind() == std::io::ErrorKind::NotFound {
            if ffprobe {
                EngineError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                }
            } else {
                EngineError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                }
            }
        } else {
            EngineError::Io(e)
        }
    }
}

/// Parses a frame rate like "24000/1001" or "30".
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f64>().ok()?;
            let den = den.parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.parse::<f64>().ok()?,
    };

    (fps.is_finite() && fps > 0.0).then_some(fps)
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, EngineError> {
        if !path.exists() {
            return Err(EngineError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args(Self::build_probe_args(path))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e, true))?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = Self::extract_probe_error(&stdout, &stderr).unwrap_or_else(|| {
                format!("ffprobe exited with code: {:?}", output.status.code())
            });
            return Err(EngineError::probe_failed(reason));
        }

        Self::parse_probe_output(path, &stdout)
    }

    async fn encode(
        &self,
        invocation: &EncodeInvocation,
        mut progress_tx: Option<mpsc::Sender<ProgressEvent>>,
    ) -> Result<(), EngineError> {
        if invocation.outputs.is_empty() {
            return Err(EngineError::NoOutputs);
        }

        let args = self.build_encode_args(invocation);
        debug!(ffmpeg = %self.config.ffmpeg_path.display(), ?args, "Starting encode");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e, false))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::encode_failed("ffmpeg stderr was not captured", None))?;
        // Raw lines: ffmpeg echoes metadata and paths that need not be UTF-8
        let mut reader = BufReader::new(stderr).split(b'\n');

        let mut parser = ProgressParser::new(
            invocation.expected_duration_secs,
            invocation.expected_frames,
        );
        let mut diagnostics: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);

        loop {
            let line = match reader.next_segment().await {
                Ok(Some(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
                Ok(None) => break,
                Err(e) => {
                    let _ = child.kill().await;
                    return Err(EngineError::Io(e));
                }
            };

            if ProgressParser::is_progress_line(&line) {
                if let Some(event) = parser.feed(&line) {
                    if let Some(tx) = progress_tx.as_ref() {
                        if tx.send(event).await.is_err() {
                            // Receiver is gone; keep encoding without progress
                            progress_tx = None;
                        }
                    }
                }
                continue;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if diagnostics.len() == DIAGNOSTIC_TAIL_LINES {
                diagnostics.pop_front();
            }
            diagnostics.push_back(line.to_string());
        }

        drop(progress_tx);
        let status = child.wait().await?;

        if !status.success() {
            let stderr = if diagnostics.is_empty() {
                None
            } else {
                Some(Vec::from(diagnostics).join("\n"))
            };
            warn!(code = ?status.code(), "ffmpeg exited unsuccessfully");
            return Err(EngineError::encode_failed(
                format!("FFmpeg exited with code: {:?}", status.code()),
                stderr,
            ));
        }

        Ok(())
    }

    async fn validate(&self) -> Result<(), EngineError> {
        for (path, ffprobe) in [
            (&self.config.ffmpeg_path, false),
            (&self.config.ffprobe_path, true),
        ] {
            let output = Command::new(path)
                .arg("-version")
                .stdin(Stdio::null())
                .output()
                .await
                .map_err(|e| self.spawn_error(e, ffprobe))?;

            if !output.status.success() {
                return Err(EngineError::BinaryUnusable {
                    path: path.clone(),
                    code: output.status.code(),
                });
            }
        }

        Ok(())
    }
}
