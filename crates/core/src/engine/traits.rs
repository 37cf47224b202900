//! Trait definitions for the engine module.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use super::error::EngineError;
use super::types::{EncodeInvocation, MediaInfo, ProgressEvent};

/// An external audio/video transcoding engine.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Inspects a media file and returns its stream metadata.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, EngineError>;

    /// Runs one invocation that writes every declared output.
    ///
    /// Progress events are sent in the order the engine reports them. The
    /// sender is dropped before this returns, so a receiver sees every event
    /// before it observes the end of the stream. Any fault fails the whole
    /// invocation, including outputs that were already written.
    async fn encode(
        &self,
        invocation: &EncodeInvocation,
        progress_tx: Option<mpsc::Sender<ProgressEvent>>,
    ) -> Result<(), EngineError>;

    /// Validates that the engine is properly configured and ready.
    async fn validate(&self) -> Result<(), EngineError>;
}
