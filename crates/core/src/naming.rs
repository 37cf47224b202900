//! Project identifiers and output file names.
//!
//! Every run gets a short random project id. The id replaces the input's
//! extension to form the base name, and the base name is then reduced to
//! `[A-Za-z0-9_-]` so it is safe on any filesystem and in any shell. The
//! reduction runs after the id is injected, so neither the original name nor a
//! forced id can smuggle unsafe characters through.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of generated project ids.
const PROJECT_ID_LEN: usize = 12;

/// Container extension used for rendition outputs.
pub const RENDITION_EXTENSION: &str = "mp4";

/// Extension of the packaged archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

static FILE_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\w+$").unwrap());

/// Names derived for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectName {
    /// Short unique token for this run.
    pub project_id: String,
    /// Sanitized stem shared by every output of the run.
    pub base_name: String,
}

impl ProjectName {
    /// Derives names from an input file name.
    ///
    /// A random id is generated unless a non-empty `project_id` is given.
    pub fn derive(file_name: &str, project_id: Option<&str>) -> Self {
        let project_id = project_id
            .map(sanitize)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(generate_project_id);

        let suffix = format!("_{}", project_id);
        let with_id = if FILE_EXTENSION.is_match(file_name) {
            FILE_EXTENSION
                .replace(file_name, regex_lite::NoExpand(&suffix))
                .into_owned()
        } else {
            format!("{}{}", file_name, suffix)
        };

        Self {
            project_id,
            base_name: sanitize(&with_id),
        }
    }

    /// File name of the rendition at a 1-based catalog position.
    pub fn rendition_file_name(&self, ordinal: usize) -> String {
        format!("{}-{}.{}", self.base_name, ordinal, RENDITION_EXTENSION)
    }

    /// File name of the packaged archive.
    pub fn archive_file_name(&self) -> String {
        format!("{}.{}", self.base_name, ARCHIVE_EXTENSION)
    }
}

/// Generates a short random project id.
pub fn generate_project_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(PROJECT_ID_LEN);
    id
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Whether a name consists only of `[A-Za-z0-9_-]` and is non-empty.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
