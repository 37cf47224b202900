//! Testing utilities and mock implementations.
//!
//! This module provides a mock of the transcoding engine so the pipeline can
//! be exercised end to end without ffmpeg installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use shrinkray_core::testing::MockEngine;
//!
//! let engine = MockEngine::new();
//! engine.set_progress_steps(10).await;
//!
//! let pipeline = ShrinkRay::new(config, engine.clone(), ZipArchiver::new());
//! ```

mod mock_engine;

pub use mock_engine::{MockEngine, RecordedEncode};
