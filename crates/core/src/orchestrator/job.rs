//! Encode job planning.

use std::path::{Path, PathBuf};

use crate::catalog::{AudioHandling, EncodeProfile, RenditionCatalog};
use crate::engine::{EncodeInvocation, OutputTarget};
use crate::naming::ProjectName;
use crate::probe::SourceMedia;

/// One rendition output within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeJob {
    /// 1-based position in the catalog.
    pub ordinal: usize,
    /// Rendition identifier.
    pub rendition_id: String,
    /// Output file inside the workspace.
    pub output_path: PathBuf,
    /// Common options followed by rendition options.
    pub options: Vec<String>,
    /// Video filter chain.
    pub filters: Vec<String>,
}

impl EncodeJob {
    /// Output file name without the workspace directory.
    pub fn file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    fn to_target(&self) -> OutputTarget {
        OutputTarget {
            path: self.output_path.clone(),
            filters: self.filters.clone(),
            options: self.options.clone(),
        }
    }
}

/// Every job of a run plus what the engine needs to report progress.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodePlan {
    /// Source media file.
    pub source: PathBuf,
    /// Jobs in catalog order.
    pub jobs: Vec<EncodeJob>,
    /// Source duration, for progress percent.
    pub expected_duration_secs: Option<f64>,
    /// Source frame count, for progress percent.
    pub expected_frames: Option<u64>,
}

impl EncodePlan {
    /// Builds the plan for one run.
    ///
    /// Ordinals follow catalog order, never completion order.
    pub fn build(
        source: &SourceMedia,
        catalog: &RenditionCatalog,
        profile: &EncodeProfile,
        retain_audio: bool,
        workspace: &Path,
        name: &ProjectName,
    ) -> Self {
        let audio = AudioHandling::resolve(retain_audio, source.audio_codec.as_deref());
        let common = profile.to_ffmpeg_args(audio);

        let jobs = catalog
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                let ordinal = idx + 1;
                let mut options = common.clone();
                options.extend(spec.output_options());

                EncodeJob {
                    ordinal,
                    rendition_id: spec.id.clone(),
                    output_path: workspace.join(name.rendition_file_name(ordinal)),
                    options,
                    filters: spec.filters.clone(),
                }
            })
            .collect();

        Self {
            source: source.path.clone(),
            jobs,
            expected_duration_secs: source.duration_secs,
            expected_frames: source.frame_count,
        }
    }

    /// The single engine invocation that produces every job.
    pub fn invocation(&self) -> EncodeInvocation {
        EncodeInvocation {
            input: self.source.clone(),
            outputs: self.jobs.iter().map(EncodeJob::to_target).collect(),
            expected_duration_secs: self.expected_duration_secs,
            expected_frames: self.expected_frames,
        }
    }

    /// Output paths in catalog order.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.jobs.iter().map(|j| j.output_path.clone()).collect()
    }
}
