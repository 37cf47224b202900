use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::catalog::{EncodeProfile, RenditionCatalog};
use crate::engine::EngineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub encode: EncodeProfile,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub catalog: RenditionCatalog,
}

/// Scratch workspace configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    /// Parent directory for per-run workspaces.
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,
    /// When to keep a run's workspace after it finishes.
    #[serde(default)]
    pub keep: KeepWorkspace,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
            keep: KeepWorkspace::default(),
        }
    }
}

fn default_workspace_root() -> PathBuf {
    std::env::temp_dir().join("shrinkray")
}

/// Workspace retention policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepWorkspace {
    /// Always remove the workspace.
    Never,
    /// Keep the workspace only when the run fails, for inspection.
    #[default]
    OnFailure,
    /// Never remove the workspace.
    Always,
}

impl KeepWorkspace {
    /// Whether a run with the given outcome keeps its workspace.
    pub fn keeps(self, succeeded: bool) -> bool {
        match self {
            KeepWorkspace::Never => false,
            KeepWorkspace::OnFailure => !succeeded,
            KeepWorkspace::Always => true,
        }
    }
}

impl fmt::Display for KeepWorkspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeepWorkspace::Never => "never",
            KeepWorkspace::OnFailure => "on_failure",
            KeepWorkspace::Always => "always",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for KeepWorkspace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "never" => Ok(KeepWorkspace::Never),
            "on_failure" => Ok(KeepWorkspace::OnFailure),
            "always" => Ok(KeepWorkspace::Always),
            other => Err(format!(
                "unknown workspace policy '{}' (expected never, on_failure or always)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_policy() {
        assert!(!KeepWorkspace::Never.keeps(false));
        assert!(!KeepWorkspace::Never.keeps(true));
        assert!(KeepWorkspace::OnFailure.keeps(false));
        assert!(!KeepWorkspace::OnFailure.keeps(true));
        assert!(KeepWorkspace::Always.keeps(true));
    }

    #[test]
    fn test_keep_policy_parse() {
        assert_eq!("never".parse(), Ok(KeepWorkspace::Never));
        assert_eq!("on-failure".parse(), Ok(KeepWorkspace::OnFailure));
        assert_eq!("ALWAYS".parse(), Ok(KeepWorkspace::Always));
        assert!("sometimes".parse::<KeepWorkspace>().is_err());
    }

    #[test]
    fn test_keep_policy_display_round_trips() {
        for policy in [
            KeepWorkspace::Never,
            KeepWorkspace::OnFailure,
            KeepWorkspace::Always,
        ] {
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.workspace.keep, KeepWorkspace::OnFailure);
        assert!(config.workspace.root.ends_with("shrinkray"));
        assert_eq!(config.catalog.len(), 2);
        assert_eq!(config.encode.crf, 23);
    }
}
