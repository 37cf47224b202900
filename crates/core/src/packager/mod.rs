//! Workspace packaging.
//!
//! Once every rendition is on disk the workspace is packed into one archive
//! next to the input. The archive only appears at its final path once it is
//! complete, so a failed packaging step never leaves a truncated archive
//! behind.

mod zip_archiver;

pub use zip_archiver::ZipArchiver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while packaging a workspace.
#[derive(Debug, Error)]
pub enum PackageError {
    /// The workspace to pack does not exist.
    #[error("Workspace not found: {path}")]
    WorkspaceNotFound { path: PathBuf },

    /// The workspace contains no files.
    #[error("Workspace is empty: {path}")]
    EmptyWorkspace { path: PathBuf },

    /// Walking the workspace failed.
    #[error("Failed to read workspace: {0}")]
    Walk(#[from] walkdir::Error),

    /// Writing the archive failed.
    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a successful packaging step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSummary {
    /// Final archive path.
    pub path: PathBuf,
    /// Entry names in archive order.
    pub entries: Vec<String>,
    /// Size of the archive in bytes.
    pub total_bytes: u64,
}

/// Packs a directory into a single archive file.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Archiver name for logging.
    fn name(&self) -> &str;

    /// Packs every file under `workspace` into `dest`.
    ///
    /// Entries are named relative to `workspace`. An existing file at `dest`
    /// is replaced.
    async fn archive(&self, workspace: &Path, dest: &Path) -> Result<ArchiveSummary, PackageError>;
}
