use std::collections::HashSet;

use super::{types::Config, ConfigError};
use crate::catalog::CATALOG_VERSION;
use crate::naming::is_safe_name;

/// Highest CRF accepted by x264.
const MAX_CRF: u8 = 51;

/// Validate configuration
/// Currently validates:
/// - Catalog version is supported and the catalog is non-empty
/// - Rendition ids are unique and filename-safe
/// - Bitrates are non-zero and the ceiling is at least the target
/// - CRF is within the encoder's range
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let catalog = &config.catalog;

    if catalog.version != CATALOG_VERSION {
        return Err(ConfigError::ValidationError(format!(
            "catalog.version {} is not supported (expected {})",
            catalog.version, CATALOG_VERSION
        )));
    }

    if catalog.is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog must define at least one rendition".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for spec in catalog.iter() {
        if !is_safe_name(&spec.id) {
            return Err(ConfigError::ValidationError(format!(
                "rendition id '{}' must match [A-Za-z0-9_-]+",
                spec.id
            )));
        }
        if !seen.insert(spec.id.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate rendition id '{}'",
                spec.id
            )));
        }

        let bitrate = &spec.bitrate;
        if bitrate.target_kbps == 0 || bitrate.max_kbps == 0 || bitrate.buffer_kbps() == 0 {
            return Err(ConfigError::ValidationError(format!(
                "rendition '{}' bitrates cannot be 0",
                spec.id
            )));
        }
        if bitrate.max_kbps < bitrate.target_kbps {
            return Err(ConfigError::ValidationError(format!(
                "rendition '{}' max_kbps ({}) is below target_kbps ({})",
                spec.id, bitrate.max_kbps, bitrate.target_kbps
            )));
        }
    }

    if config.encode.crf > MAX_CRF {
        return Err(ConfigError::ValidationError(format!(
            "encode.crf must be between 0 and {}",
            MAX_CRF
        )));
    }

    Ok(())
}
