//! The end-to-end pipeline.
//!
//! A run probes the input, derives its project name, encodes every catalog
//! rendition into a scratch workspace in one engine invocation, and packs the
//! workspace into `<base name>.zip` next to the input. Failures are logged and
//! returned; the library never terminates the process.

mod error;
mod options;

pub use error::{PipelineError, Stage};
pub use options::{Logger, PipelineOptions, PipelineResult};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::engine::{FfmpegEngine, TranscodeEngine};
use crate::naming::ProjectName;
use crate::orchestrator::{EncodeOrchestrator, EncodePlan};
use crate::packager::{Archiver, ZipArchiver};
use crate::probe::{MediaProbe, SourceMedia};

/// Prefix of per-run workspace directories.
const WORKSPACE_PREFIX: &str = "shrinkray-";

/// Runs the pipeline with default configuration, ffmpeg from `PATH`, and zip
/// packaging.
pub async fn shrink_ray(
    path: impl AsRef<Path>,
    options: PipelineOptions,
) -> Result<PipelineResult, PipelineError> {
    ShrinkRay::new(
        Config::default(),
        FfmpegEngine::with_defaults(),
        ZipArchiver::new(),
    )
    .run(path, options)
    .await
}

/// Pipeline facade over an engine and an archiver.
///
/// Holds no per-run state, so one instance can serve concurrent runs.
pub struct ShrinkRay<E: TranscodeEngine, A: Archiver> {
    config: Config,
    engine: Arc<E>,
    archiver: Arc<A>,
}

impl<E: TranscodeEngine, A: Archiver> ShrinkRay<E, A> {
    /// Creates a pipeline.
    pub fn new(config: Config, engine: E, archiver: A) -> Self {
        Self {
            config,
            engine: Arc::new(engine),
            archiver: Arc::new(archiver),
        }
    }

    /// Returns the pipeline configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Workspace directory used by a project.
    pub fn workspace_for(&self, project_id: &str) -> PathBuf {
        self.config
            .workspace
            .root
            .join(format!("{}{}", WORKSPACE_PREFIX, project_id))
    }

    /// Runs the pipeline on one input file.
    pub async fn run(
        &self,
        path: impl AsRef<Path>,
        options: PipelineOptions,
    ) -> Result<PipelineResult, PipelineError> {
        let path = path.as_ref();
        let started = Instant::now();
        debug!(stage = %Stage::Start, input = %path.display(), "Pipeline started");

        match self.execute(path, &options).await {
            Ok(result) => {
                info!(
                    stage = %Stage::Done,
                    archive = %result.archive_path.display(),
                    renditions = result.renditions.len(),
                    bytes = result.archive_bytes,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Pipeline finished"
                );
                options
                    .logger
                    .log(&format!("Created {}", result.archive_path.display()));
                Ok(result)
            }
            Err(err) => {
                error!(
                    stage = %Stage::Aborted,
                    failed_in = %err.stage(),
                    input = %path.display(),
                    error = %err,
                    diagnostics = err.diagnostics().unwrap_or(""),
                    "Pipeline aborted"
                );
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        path: &Path,
        options: &PipelineOptions,
    ) -> Result<PipelineResult, PipelineError> {
        debug!(stage = %Stage::Probing, input = %path.display());
        let source = MediaProbe::new(Arc::clone(&self.engine)).probe(path).await?;

        debug!(stage = %Stage::Naming);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .ok_or_else(|| {
                PipelineError::InvalidInput(format!("{} has no file name", path.display()))
            })?;
        let name = ProjectName::derive(&file_name, options.project_id.as_deref());
        let archive_path = path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(name.archive_file_name());

        let workspace = self.workspace_for(&name.project_id);
        prepare_workspace(&workspace).await?;
        debug!(
            project_id = %name.project_id,
            base_name = %name.base_name,
            workspace = %workspace.display(),
            "Workspace ready"
        );

        let result = self
            .encode_and_package(path, &workspace, &archive_path, &name, options, &source)
            .await;

        let keep = self.config.workspace.keep.keeps(result.is_ok());
        if keep {
            debug!(workspace = %workspace.display(), "Keeping workspace");
        } else if let Err(e) = tokio::fs::remove_dir_all(&workspace).await {
            warn!(workspace = %workspace.display(), error = %e, "Failed to remove workspace");
        }

        result
    }

    async fn encode_and_package(
        &self,
        path: &Path,
        workspace: &Path,
        archive_path: &Path,
        name: &ProjectName,
        options: &PipelineOptions,
        source: &SourceMedia,
    ) -> Result<PipelineResult, PipelineError> {
        let plan = EncodePlan::build(
            source,
            &self.config.catalog,
            &self.config.encode,
            options.retain_audio,
            workspace,
            name,
        );
        debug!(
            stage = %Stage::Encoding,
            input = %path.display(),
            renditions = plan.jobs.len()
        );
        EncodeOrchestrator::new(Arc::clone(&self.engine))
            .run(&plan, options.on_progress.as_ref())
            .await?;

        debug!(
            stage = %Stage::Packaging,
            archiver = self.archiver.name(),
            archive = %archive_path.display()
        );
        let summary = self.archiver.archive(workspace, archive_path).await?;

        Ok(PipelineResult {
            archive_path: summary.path,
            project_id: name.project_id.clone(),
            base_name: name.base_name.clone(),
            renditions: summary.entries,
            archive_bytes: summary.total_bytes,
        })
    }
}

/// Creates an empty workspace, clearing leftovers from an earlier run of the
/// same project.
async fn prepare_workspace(workspace: &Path) -> Result<(), PipelineError> {
    let _ = tokio::fs::remove_dir_all(workspace).await;

    tokio::fs::create_dir_all(workspace)
        .await
        .map_err(|source| PipelineError::Workspace {
            path: workspace.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeepWorkspace, WorkspaceConfig};
    use crate::engine::EngineError;
    use crate::testing::MockEngine;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        input: PathBuf,
        root: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("clip.mp4");
        std::fs::write(&input, "source").unwrap();
        let root = dir.path().join("work");
        Fixture {
            input,
            root,
            _dir: dir,
        }
    }

    fn pipeline(
        fixture: &Fixture,
        engine: MockEngine,
        keep: KeepWorkspace,
    ) -> ShrinkRay<MockEngine, ZipArchiver> {
        let config = Config {
            workspace: WorkspaceConfig {
                root: fixture.root.clone(),
                keep,
            },
            ..Config::default()
        };
        ShrinkRay::new(config, engine, ZipArchiver::new())
    }

    #[tokio::test]
    async fn test_run_creates_archive_next_to_input() {
        let fixture = fixture();
        let pipeline = pipeline(&fixture, MockEngine::new(), KeepWorkspace::Never);

        let result = pipeline
            .run(
                &fixture.input,
                PipelineOptions::new().with_logger(false).with_project_id("abc"),
            )
            .await
            .unwrap();

        assert_eq!(result.project_id, "abc");
        assert_eq!(result.base_name, "clip_abc");
        assert_eq!(result.archive_path, fixture.input.with_file_name("clip_abc.zip"));
        assert_eq!(result.renditions, vec!["clip_abc-1.mp4", "clip_abc-2.mp4"]);
        assert!(result.archive_path.exists());
        assert!(!pipeline.workspace_for("abc").exists());
    }

    #[tokio::test]
    async fn test_logger_receives_completion_message() {
        let fixture = fixture();
        let pipeline = pipeline(&fixture, MockEngine::new(), KeepWorkspace::Never);
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);

        let result = pipeline
            .run(
                &fixture.input,
                PipelineOptions::new()
                    .with_logger(Logger::custom(move |m| {
                        sink.lock().unwrap().push(m.to_string())
                    }))
                    .with_project_id("abc"),
            )
            .await
            .unwrap();

        assert_eq!(
            *messages.lock().unwrap(),
            vec![format!("Created {}", result.archive_path.display())]
        );
    }

    #[tokio::test]
    async fn test_probe_failure_creates_no_workspace() {
        let fixture = fixture();
        let engine = MockEngine::new();
        engine
            .set_probe_error(EngineError::probe_failed("moov atom not found"))
            .await;
        let pipeline = pipeline(&fixture, engine.clone(), KeepWorkspace::Always);

        let err = pipeline
            .run(
                &fixture.input,
                PipelineOptions::new().with_logger(false).with_project_id("abc"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Probing);
        assert!(err.to_string().contains("moov atom not found"));
        assert_eq!(engine.encode_count().await, 0);
        assert!(!fixture.root.exists());
    }

    #[tokio::test]
    async fn test_encode_failure_keeps_workspace_on_failure() {
        let fixture = fixture();
        let engine = MockEngine::new();
        engine
            .set_encode_error(EngineError::encode_failed("exit 1", None), 1)
            .await;
        let pipeline = pipeline(&fixture, engine, KeepWorkspace::OnFailure);

        let err = pipeline
            .run(
                &fixture.input,
                PipelineOptions::new().with_logger(false).with_project_id("abc"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Encoding);
        let workspace = pipeline.workspace_for("abc");
        assert!(workspace.join("clip_abc-1.mp4").exists());
        assert!(!fixture.input.with_file_name("clip_abc.zip").exists());
    }

    #[tokio::test]
    async fn test_success_removes_workspace_on_failure_policy() {
        let fixture = fixture();
        let pipeline = pipeline(&fixture, MockEngine::new(), KeepWorkspace::OnFailure);

        pipeline
            .run(
                &fixture.input,
                PipelineOptions::new().with_logger(false).with_project_id("abc"),
            )
            .await
            .unwrap();

        assert!(!pipeline.workspace_for("abc").exists());
    }

    #[tokio::test]
    async fn test_stale_workspace_is_cleared() {
        let fixture = fixture();
        let pipeline = pipeline(&fixture, MockEngine::new(), KeepWorkspace::Always);
        let workspace = pipeline.workspace_for("abc");
        std::fs::create_dir_all(&workspace).unwrap();
        std::fs::write(workspace.join("leftover.mp4"), "stale").unwrap();

        let result = pipeline
            .run(
                &fixture.input,
                PipelineOptions::new().with_logger(false).with_project_id("abc"),
            )
            .await
            .unwrap();

        assert_eq!(result.renditions, vec!["clip_abc-1.mp4", "clip_abc-2.mp4"]);
        assert!(workspace.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_file_name_is_sanitized() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let fixture = fixture();
        let input = fixture
            .input
            .with_file_name(OsStr::from_bytes(b"caf\xe9.mp4"));
        std::fs::write(&input, "source").unwrap();
        let pipeline = pipeline(&fixture, MockEngine::new(), KeepWorkspace::Never);
        assert_eq!(pipeline.config().workspace.root, fixture.root);

        let result = pipeline
            .run(
                &input,
                PipelineOptions::new().with_logger(false).with_project_id("abc"),
            )
            .await
            .unwrap();

        assert_eq!(result.base_name, "caf__abc");
        assert_eq!(result.archive_path, input.with_file_name("caf__abc.zip"));
        assert!(result.archive_path.exists());
    }

    #[tokio::test]
    async fn test_input_without_file_name() {
        let fixture = fixture();
        let pipeline = pipeline(&fixture, MockEngine::new(), KeepWorkspace::Never);

        let err = pipeline
            .run("/", PipelineOptions::new().with_logger(false))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }
}
