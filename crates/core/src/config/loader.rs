use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides, e.g. `SHRINKRAY_WORKSPACE__KEEP=always`.
const ENV_PREFIX: &str = "SHRINKRAY_";

fn env_overrides() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from an optional file.
///
/// Without a file, built-in defaults are used with environment overrides.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Figment::from(Serialized::defaults(Config::default()))
            .merge(env_overrides())
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string())),
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeepWorkspace;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_empty() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[engine]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"

[encode]
preset = "fast"

[workspace]
root = "/var/tmp/shrinkray"
keep = "always"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(
            config.engine.ffmpeg_path.to_str(),
            Some("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.engine.ffprobe_path.to_str(), Some("ffprobe"));
        assert_eq!(config.encode.preset, "fast");
        assert_eq!(config.encode.crf, 23);
        assert_eq!(config.workspace.keep, KeepWorkspace::Always);
        assert_eq!(config.catalog.ids(), vec!["16x9", "1x1"]);
    }

    #[test]
    fn test_load_config_from_str_catalog() {
        let toml = r#"
[[catalog.renditions]]
id = "9x16"
filters = ["crop=in_h*9/16:in_h"]
bitrate = { target_kbps = 1200, max_kbps = 1500 }
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.catalog.ids(), vec!["9x16"]);
    }

    #[test]
    fn test_load_config_from_str_bad_policy() {
        let toml = r#"
[workspace]
keep = "sometimes"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[encode]
crf = 20

[workspace]
keep = "never"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.encode.crf, 20);
        assert_eq!(config.encode.preset, "veryslow");
        assert_eq!(config.workspace.keep, KeepWorkspace::Never);
    }

    #[test]
    fn test_load_config_or_default_without_file() {
        let config = load_config_or_default(None).unwrap();
        assert_eq!(config.catalog.len(), 2);
    }
}
