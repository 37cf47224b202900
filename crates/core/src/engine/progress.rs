//! Parser for ffmpeg's `-progress` key/value stream.
//!
//! ffmpeg writes blocks of `key=value` lines terminated by a
//! `progress=continue` or `progress=end` line. Each completed block becomes one
//! [`ProgressEvent`].

use super::types::ProgressEvent;

/// Accumulates `-progress` lines and emits one event per block.
#[derive(Debug, Clone, Default)]
pub struct ProgressParser {
    expected_duration_secs: Option<f64>,
    expected_frames: Option<u64>,
    frames: u64,
    fps: f32,
    out_time_secs: f64,
    last_percent: f32,
}

impl ProgressParser {
    /// Creates a parser that computes percent against the given totals.
    pub fn new(expected_duration_secs: Option<f64>, expected_frames: Option<u64>) -> Self {
        Self {
            expected_duration_secs: expected_duration_secs.filter(|d| *d > 0.0),
            expected_frames: expected_frames.filter(|f| *f > 0),
            ..Default::default()
        }
    }

    /// Returns true if the line belongs to the progress protocol.
    pub fn is_progress_line(line: &str) -> bool {
        match line.split_once('=') {
            Some((key, _)) => {
                !key.is_empty()
                    && key
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            }
            None => false,
        }
    }

    /// Feeds one line; returns an event when a block is complete.
    pub fn feed(&mut self, line: &str) -> Option<ProgressEvent> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();

        match key {
            "frame" => {
                if let Ok(frames) = value.parse::<u64>() {
                    self.frames = frames;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse::<f32>() {
                    self.fps = fps;
                }
            }
            // out_time_ms is also in microseconds, an old ffmpeg quirk
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    if us >= 0 {
                        self.out_time_secs = us as f64 / 1_000_000.0;
                    }
                }
            }
            "progress" => return Some(self.emit(value == "end")),
            _ => {}
        }

        None
    }

    fn emit(&mut self, finished: bool) -> ProgressEvent {
        let raw = if finished {
            100.0
        } else if let Some(duration) = self.expected_duration_secs {
            (self.out_time_secs / duration * 100.0) as f32
        } else if let Some(total) = self.expected_frames {
            (self.frames as f64 / total as f64 * 100.0) as f32
        } else {
            0.0
        };

        // Never report going backwards
        let percent = raw.clamp(0.0, 100.0).max(self.last_percent);
        self.last_percent = percent;

        ProgressEvent {
            frames: self.frames,
            current_fps: self.fps,
            percent,
            timemark: format_timemark(self.out_time_secs),
        }
    }
}

/// Formats seconds as `HH:MM:SS.cc`.
pub fn format_timemark(secs: f64) -> String {
    let centis = (secs.max(0.0) * 100.0).round() as u64;
    let hours = centis / 360_000;
    let minutes = (centis / 6_000) % 60;
    let seconds = (centis / 100) % 60;
    let fraction = centis % 100;
    format!("{:02}:{:02}:{:02}.{:02}", hours, minutes, seconds, fraction)
}
