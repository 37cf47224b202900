//! Rendition catalog types.

use serde::{Deserialize, Serialize};

/// Current catalog schema version.
pub const CATALOG_VERSION: u32 = 1;

/// Bitrate limits for one rendition, in kbps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitrateLimits {
    /// Average bitrate the encoder aims for.
    pub target_kbps: u32,
    /// Peak bitrate ceiling.
    pub max_kbps: u32,
    /// Rate-control buffer size. Defaults to twice the ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_kbps: Option<u32>,
}

impl BitrateLimits {
    /// Creates limits with the default buffer size.
    pub fn new(target_kbps: u32, max_kbps: u32) -> Self {
        Self {
            target_kbps,
            max_kbps,
            buffer_kbps: None,
        }
    }

    /// Effective rate-control buffer size.
    pub fn buffer_kbps(&self) -> u32 {
        self.buffer_kbps
            .unwrap_or_else(|| self.max_kbps.saturating_mul(2))
    }

    /// Convert to ffmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-b:v".to_string(),
            format!("{}k", self.target_kbps),
            "-maxrate".to_string(),
            format!("{}k", self.max_kbps),
            "-bufsize".to_string(),
            format!("{}k", self.buffer_kbps()),
        ]
    }
}

/// Encode parameters for one aspect-ratio class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionSpec {
    /// Identifier, e.g. "16x9".
    pub id: String,
    /// Video filter expressions, applied in order.
    #[serde(default)]
    pub filters: Vec<String>,
    /// Bitrate target and ceiling.
    pub bitrate: BitrateLimits,
    /// Additional output options appended after the bitrate options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_options: Vec<String>,
}

impl RenditionSpec {
    /// Creates a spec with a filter chain and bitrate limits.
    pub fn new(id: impl Into<String>, filters: Vec<String>, bitrate: BitrateLimits) -> Self {
        Self {
            id: id.into(),
            filters,
            bitrate,
            extra_options: Vec::new(),
        }
    }

    /// Rendition-specific output options.
    pub fn output_options(&self) -> Vec<String> {
        let mut options = self.bitrate.to_ffmpeg_args();
        options.extend(self.extra_options.iter().cloned());
        options
    }
}

/// A versioned, insertion-ordered set of renditions.
///
/// Order is significant: the position of a spec determines the ordinal in
/// its output filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionCatalog {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Renditions in output order.
    pub renditions: Vec<RenditionSpec>,
}

fn default_version() -> u32 {
    CATALOG_VERSION
}

impl Default for RenditionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RenditionCatalog {
    /// Creates a catalog from an ordered list of specs.
    pub fn new(renditions: Vec<RenditionSpec>) -> Self {
        Self {
            version: CATALOG_VERSION,
            renditions,
        }
    }

    /// The renditions shipped by default: a widescreen crop and a square crop.
    pub fn builtin() -> Self {
        Self::new(vec![
            RenditionSpec::new(
                "16x9",
                vec!["crop=in_w:in_w*min(in_w/in_h\\,in_h/in_w)".to_string()],
                BitrateLimits::new(1900, 2400),
            ),
            RenditionSpec::new(
                "1x1",
                vec!["crop=min(in_h\\,in_w):min(in_h\\,in_w)".to_string()],
                BitrateLimits::new(1000, 1400),
            ),
        ])
    }

    /// Iterates renditions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &RenditionSpec> {
        self.renditions.iter()
    }

    /// Number of renditions.
    pub fn len(&self) -> usize {
        self.renditions.len()
    }

    /// Whether the catalog declares no renditions.
    pub fn is_empty(&self) -> bool {
        self.renditions.is_empty()
    }

    /// Looks up a rendition by identifier.
    pub fn get(&self, id: &str) -> Option<&RenditionSpec> {
        self.renditions.iter().find(|r| r.id == id)
    }

    /// Rendition identifiers in declaration order.
    pub fn ids(&self) -> Vec<&str> {
        self.renditions.iter().map(|r| r.id.as_str()).collect()
    }
}
