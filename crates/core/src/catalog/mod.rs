//! Rendition catalog: which renditions to produce and how to encode them.
//!
//! The catalog is plain data. Adding a rendition means adding an entry to the
//! built-in list or to the `[catalog]` table of the config file; nothing
//! mutates it at runtime.

mod profile;
mod types;

pub use profile::{AudioHandling, EncodeProfile};
pub use types::{BitrateLimits, RenditionCatalog, RenditionSpec, CATALOG_VERSION};
