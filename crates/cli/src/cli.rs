//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

use shrinkray_core::KeepWorkspace;

#[derive(Debug, Parser)]
#[command(
    name = "shrink-ray",
    version,
    about = "Turn videos into zips of aspect-ratio renditions",
    after_help = "EXAMPLES:\n  \
                  shrink-ray clip.mp4\n  \
                  shrink-ray --retain-audio --jobs 2 *.mov\n  \
                  shrink-ray --config shrinkray.toml --keep-workspace always clip.mp4"
)]
pub struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Copy source audio into every rendition
    #[arg(long)]
    pub retain_audio: bool,

    /// Only log warnings and errors, and hide progress
    #[arg(short, long)]
    pub quiet: bool,

    /// When to keep scratch workspaces: never, on_failure, always
    #[arg(long, value_name = "POLICY")]
    pub keep_workspace: Option<KeepWorkspace>,

    /// Number of inputs processed at once
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Input video files
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

impl Args {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub fn default_filter(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_parse_defaults() {
        let args = assert_ok!(Args::try_parse_from(["shrink-ray", "clip.mp4"]));
        assert_eq!(args.files, vec![PathBuf::from("clip.mp4")]);
        assert_eq!(args.jobs, 1);
        assert!(!args.retain_audio);
        assert!(args.keep_workspace.is_none());
        assert_eq!(args.default_filter(), "info");
    }

    #[test]
    fn test_parse_all_flags() {
        let args = assert_ok!(Args::try_parse_from([
            "shrink-ray",
            "--config",
            "shrinkray.toml",
            "--retain-audio",
            "--quiet",
            "--keep-workspace",
            "always",
            "--jobs",
            "3",
            "a.mp4",
            "b.mov",
        ]));
        assert_eq!(args.config, Some(PathBuf::from("shrinkray.toml")));
        assert!(args.retain_audio);
        assert_eq!(args.keep_workspace, Some(KeepWorkspace::Always));
        assert_eq!(args.jobs, 3);
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.default_filter(), "warn");
    }

    #[test]
    fn test_requires_a_file() {
        assert_err!(Args::try_parse_from(["shrink-ray"]));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert_err!(Args::try_parse_from([
            "shrink-ray",
            "--keep-workspace",
            "sometimes",
            "clip.mp4"
        ]));
    }

    #[test]
    fn test_rejects_zero_jobs() {
        assert_err!(Args::try_parse_from(["shrink-ray", "--jobs", "0", "clip.mp4"]));
    }
}
