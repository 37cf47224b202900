//! Mock engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::engine::{
    EncodeInvocation, EngineError, MediaInfo, ProgressEvent, TranscodeEngine, VideoStreamInfo,
};

/// A recorded encode invocation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedEncode {
    /// The invocation that was submitted.
    pub invocation: EncodeInvocation,
    /// Whether the encode succeeded.
    pub success: bool,
}

/// Mock implementation of the TranscodeEngine trait.
///
/// Provides controllable behavior for testing:
/// - Track encode invocations for assertions
/// - Simulate probe and encode failures
/// - Control probe results
/// - Emit scripted progress
/// - Write placeholder output files, optionally only some before failing
///
/// Placeholder outputs contain the output's filters and options, so two
/// identical invocations produce byte-identical files.
///
/// # Example
///
/// ```rust,ignore
/// use shrinkray_core::testing::MockEngine;
///
/// let engine = MockEngine::new();
/// engine.set_encode_error(EngineError::encode_failed("boom", None), 1).await;
///
/// let result = engine.encode(&invocation, None).await;
/// assert!(result.is_err());
/// assert_eq!(engine.encode_count().await, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockEngine {
    /// Recorded encodes.
    encodes: Arc<RwLock<Vec<RecordedEncode>>>,
    /// Pre-configured probe results by path.
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaInfo>>>,
    /// If set, the next probe will fail with this error.
    probe_error: Arc<RwLock<Option<EngineError>>>,
    /// If set, the next encode fails after writing this many outputs.
    encode_error: Arc<RwLock<Option<(EngineError, usize)>>>,
    /// Number of progress events emitted per encode.
    progress_steps: Arc<RwLock<usize>>,
    /// Whether encodes write placeholder files.
    write_outputs: Arc<RwLock<bool>>,
    /// Number of probe calls.
    probes: Arc<AtomicUsize>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self {
            encodes: Arc::new(RwLock::new(Vec::new())),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            probe_error: Arc::new(RwLock::new(None)),
            encode_error: Arc::new(RwLock::new(None)),
            progress_steps: Arc::new(RwLock::new(4)),
            write_outputs: Arc::new(RwLock::new(true)),
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded encodes.
    pub async fn recorded_encodes(&self) -> Vec<RecordedEncode> {
        self.encodes.read().await.clone()
    }

    /// Get the number of encodes attempted.
    pub async fn encode_count(&self) -> usize {
        self.encodes.read().await.len()
    }

    /// Get the number of probes performed.
    pub async fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Set a probe result for a specific path.
    pub async fn set_probe_result(&self, path: impl AsRef<Path>, info: MediaInfo) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), info);
    }

    /// Configure the next probe to fail with the given error.
    pub async fn set_probe_error(&self, error: EngineError) {
        *self.probe_error.write().await = Some(error);
    }

    /// Configure the next encode to fail after writing `outputs_written` outputs.
    pub async fn set_encode_error(&self, error: EngineError, outputs_written: usize) {
        *self.encode_error.write().await = Some((error, outputs_written));
    }

    /// Set how many progress events each encode emits.
    pub async fn set_progress_steps(&self, steps: usize) {
        *self.progress_steps.write().await = steps;
    }

    /// Enable or disable writing placeholder outputs.
    pub async fn set_write_outputs(&self, write: bool) {
        *self.write_outputs.write().await = write;
    }

    /// Create a default MediaInfo for testing.
    pub fn default_media_info(path: &Path) -> MediaInfo {
        MediaInfo {
            path: path.to_path_buf(),
            format: "mov".to_string(),
            duration_secs: Some(10.0),
            video_streams: vec![VideoStreamInfo {
                codec: Some("h264".to_string()),
                width: 1920,
                height: 1080,
                frame_rate: Some(30.0),
                frame_count: Some(300),
            }],
            has_audio: true,
            audio_codec: Some("aac".to_string()),
        }
    }

    async fn write_placeholders(
        invocation: &EncodeInvocation,
        count: usize,
    ) -> Result<(), EngineError> {
        for output in invocation.outputs.iter().take(count) {
            let contents = format!(
                "{}\n{}\n{}\n",
                invocation.input.display(),
                output.filters.join(","),
                output.options.join(" ")
            );
            tokio::fs::write(&output.path, contents).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TranscodeEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, EngineError> {
        self.probes.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.probe_error.write().await.take() {
            return Err(err);
        }

        if let Some(info) = self.probe_results.read().await.get(path) {
            return Ok(info.clone());
        }

        Ok(Self::default_media_info(path))
    }

    async fn encode(
        &self,
        invocation: &EncodeInvocation,
        progress_tx: Option<mpsc::Sender<ProgressEvent>>,
    ) -> Result<(), EngineError> {
        if invocation.outputs.is_empty() {
            return Err(EngineError::NoOutputs);
        }

        let write = *self.write_outputs.read().await;

        if let Some((err, written)) = self.encode_error.write().await.take() {
            self.encodes.write().await.push(RecordedEncode {
                invocation: invocation.clone(),
                success: false,
            });
            if write {
                Self::write_placeholders(invocation, written).await?;
            }
            return Err(err);
        }

        self.encodes.write().await.push(RecordedEncode {
            invocation: invocation.clone(),
            success: true,
        });

        let steps = *self.progress_steps.read().await;
        if let Some(tx) = progress_tx {
            let total_frames = invocation.expected_frames.unwrap_or(300);
            for i in 1..=steps {
                let fraction = i as f64 / steps as f64;
                let secs = invocation.expected_duration_secs.unwrap_or(10.0) * fraction;
                let _ = tx
                    .send(ProgressEvent {
                        frames: (total_frames as f64 * fraction) as u64,
                        current_fps: 30.0,
                        percent: (fraction * 100.0) as f32,
                        timemark: crate::engine::format_timemark(secs),
                    })
                    .await;
            }
        }

        if write {
            Self::write_placeholders(invocation, invocation.outputs.len()).await?;
        }

        Ok(())
    }

    async fn validate(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OutputTarget;
    use tempfile::TempDir;

    fn invocation(dir: &Path, outputs: usize) -> EncodeInvocation {
        EncodeInvocation {
            input: PathBuf::from("/media/clip.mp4"),
            outputs: (1..=outputs)
                .map(|i| OutputTarget {
                    path: dir.join(format!("clip-{}.mp4", i)),
                    filters: vec![format!("crop={}", i)],
                    options: vec!["-an".to_string()],
                })
                .collect(),
            expected_duration_secs: Some(10.0),
            expected_frames: Some(300),
        }
    }

    #[tokio::test]
    async fn test_default_probe() {
        let engine = MockEngine::new();
        let info = engine.probe(Path::new("/media/clip.mov")).await.unwrap();
        assert_eq!(info.primary_video().unwrap().width, 1920);
        assert_eq!(engine.probe_count().await, 1);
    }

    #[tokio::test]
    async fn test_encode_writes_outputs_and_progress() {
        let dir = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let (tx, mut rx) = mpsc::channel(16);

        engine.encode(&invocation(dir.path(), 2), Some(tx)).await.unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 4);
        assert_eq!(events.last().unwrap().percent, 100.0);
        assert!(dir.path().join("clip-1.mp4").exists());
        assert!(dir.path().join("clip-2.mp4").exists());
    }

    #[tokio::test]
    async fn test_encode_error_after_partial_outputs() {
        let dir = TempDir::new().unwrap();
        let engine = MockEngine::new();
        engine
            .set_encode_error(EngineError::encode_failed("boom", None), 1)
            .await;

        let result = engine.encode(&invocation(dir.path(), 2), None).await;
        assert!(result.is_err());
        assert!(dir.path().join("clip-1.mp4").exists());
        assert!(!dir.path().join("clip-2.mp4").exists());

        let encodes = engine.recorded_encodes().await;
        assert_eq!(encodes.len(), 1);
        assert!(!encodes[0].success);
    }

    #[tokio::test]
    async fn test_probe_error_consumed() {
        let engine = MockEngine::new();
        engine.set_probe_error(EngineError::probe_failed("bad")).await;

        assert!(engine.probe(Path::new("/a.mp4")).await.is_err());
        assert!(engine.probe(Path::new("/a.mp4")).await.is_ok());
    }
}
