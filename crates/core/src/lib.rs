//! Turn one video into a zip of aspect-ratio renditions.
//!
//! ```rust,ignore
//! use shrinkray_core::{shrink_ray, PipelineOptions};
//!
//! let result = shrink_ray("clip.mp4", PipelineOptions::new()).await?;
//! println!("{}", result.archive_path.display());
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod naming;
pub mod orchestrator;
pub mod packager;
pub mod pipeline;
pub mod probe;
pub mod testing;

pub use catalog::{
    AudioHandling, BitrateLimits, EncodeProfile, RenditionCatalog, RenditionSpec, CATALOG_VERSION,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, KeepWorkspace, WorkspaceConfig,
};
pub use engine::{
    EngineConfig, EngineError, FfmpegEngine, MediaInfo, ProgressEvent, TranscodeEngine,
};
pub use naming::ProjectName;
pub use orchestrator::{EncodeError, EncodeJob, EncodeOrchestrator, EncodePlan, ProgressCallback};
pub use packager::{ArchiveSummary, Archiver, PackageError, ZipArchiver};
pub use pipeline::{
    shrink_ray, Logger, PipelineError, PipelineOptions, PipelineResult, ShrinkRay, Stage,
};
pub use probe::{MediaProbe, ProbeError, SourceMedia};
