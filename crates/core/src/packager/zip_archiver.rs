//! Zip implementation of [`Archiver`].

use async_trait::async_trait;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{ArchiveSummary, Archiver, PackageError};

/// Suffix of the archive while it is being written.
const PARTIAL_SUFFIX: &str = "partial";

/// Packs workspaces as deflated zip archives.
#[derive(Debug, Clone, Default)]
pub struct ZipArchiver;

impl ZipArchiver {
    /// Creates a zip archiver.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    fn name(&self) -> &str {
        "zip"
    }

    async fn archive(&self, workspace: &Path, dest: &Path) -> Result<ArchiveSummary, PackageError> {
        let workspace = workspace.to_path_buf();
        let dest = dest.to_path_buf();

        tokio::task::spawn_blocking(move || write_archive(&workspace, &dest))
            .await
            .map_err(|e| PackageError::Io(io::Error::other(e)))?
    }
}

/// Collects regular files under `root` as (entry name, path), sorted by name.
fn collect_entries(root: &Path) -> Result<Vec<(String, PathBuf)>, PackageError> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| PackageError::Io(io::Error::other(e)))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        entries.push((name, entry.path().to_path_buf()));
    }

    Ok(entries)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    dest.with_file_name(name)
}

fn write_archive(workspace: &Path, dest: &Path) -> Result<ArchiveSummary, PackageError> {
    if !workspace.is_dir() {
        return Err(PackageError::WorkspaceNotFound {
            path: workspace.to_path_buf(),
        });
    }

    let entries = collect_entries(workspace)?;
    if entries.is_empty() {
        return Err(PackageError::EmptyWorkspace {
            path: workspace.to_path_buf(),
        });
    }

    let partial = partial_path(dest);
    let written = write_entries(&entries, &partial);
    if let Err(e) = written {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }

    std::fs::rename(&partial, dest)?;
    let total_bytes = std::fs::metadata(dest)?.len();

    debug!(
        archive = %dest.display(),
        entries = entries.len(),
        bytes = total_bytes,
        "Archive written"
    );

    Ok(ArchiveSummary {
        path: dest.to_path_buf(),
        entries: entries.into_iter().map(|(name, _)| name).collect(),
        total_bytes,
    })
}

fn write_entries(entries: &[(String, PathBuf)], archive_path: &Path) -> Result<(), PackageError> {
    let file = File::create(archive_path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);

    for (name, path) in entries {
        zip.start_file(name.as_str(), options)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut zip)?;
    }

    let mut writer = zip.finish()?;
    io::Write::flush(&mut writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn read_archive(path: &Path) -> Vec<(String, String)> {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut contents = String::new();
                file.read_to_string(&mut contents).unwrap();
                (file.name().to_string(), contents)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_archive_contains_sorted_entries() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().join("ws");
        std::fs::create_dir(&workspace).unwrap();
        std::fs::write(workspace.join("clip_abc-2.mp4"), "second").unwrap();
        std::fs::write(workspace.join("clip_abc-1.mp4"), "first").unwrap();
        let dest = dir.path().join("clip_abc.zip");

        let summary = ZipArchiver::new().archive(&workspace, &dest).await.unwrap();

        assert_eq!(summary.path, dest);
        assert_eq!(summary.entries, vec!["clip_abc-1.mp4", "clip_abc-2.mp4"]);
        assert!(summary.total_bytes > 0);
        assert_eq!(
            read_archive(&dest),
            vec![
                ("clip_abc-1.mp4".to_string(), "first".to_string()),
                ("clip_abc-2.mp4".to_string(), "second".to_string()),
            ]
        );
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_nested_entries_use_forward_slashes() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().join("ws");
        std::fs::create_dir_all(workspace.join("sub")).unwrap();
        std::fs::write(workspace.join("sub").join("a.mp4"), "a").unwrap();
        let dest = dir.path().join("out.zip");

        let summary = ZipArchiver::new().archive(&workspace, &dest).await.unwrap();
        assert_eq!(summary.entries, vec!["sub/a.mp4"]);
    }

    #[tokio::test]
    async fn test_missing_workspace() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.zip");

        let err = ZipArchiver::new()
            .archive(&dir.path().join("missing"), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, PackageError::WorkspaceNotFound { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_empty_workspace() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().join("ws");
        std::fs::create_dir(&workspace).unwrap();
        let dest = dir.path().join("out.zip");

        let err = ZipArchiver::new().archive(&workspace, &dest).await.unwrap_err();
        assert!(matches!(err, PackageError::EmptyWorkspace { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_unwritable_destination_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().join("ws");
        std::fs::create_dir(&workspace).unwrap();
        std::fs::write(workspace.join("a.mp4"), "a").unwrap();
        let dest = dir.path().join("missing-dir").join("out.zip");

        let err = ZipArchiver::new().archive(&workspace, &dest).await.unwrap_err();
        assert!(matches!(err, PackageError::Io(_)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_existing_archive_replaced() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().join("ws");
        std::fs::create_dir(&workspace).unwrap();
        std::fs::write(workspace.join("a.mp4"), "new").unwrap();
        let dest = dir.path().join("out.zip");
        std::fs::write(&dest, "stale").unwrap();

        ZipArchiver::new().archive(&workspace, &dest).await.unwrap();
        assert_eq!(
            read_archive(&dest),
            vec![("a.mp4".to_string(), "new".to_string())]
        );
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/media/clip.zip")),
            PathBuf::from("/media/clip.zip.partial")
        );
    }
}
