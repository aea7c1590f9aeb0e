//! Configuration for javago.
//!
//! Loads config from:
//! 1. Global: ~/.config/javago/config.toml
//! 2. Per-project: .javago/config.toml (overrides global)
//!
//! Example config.toml:
//! ```toml
//! [lowering]
//! excluded_annotations = ["Ignore", "GwtIncompatible"]
//! ternary_helper = "ternary"
//!
//! [output]
//! extension = "go"
//! module = "example.com/app"
//! ```

use crate::lower::LowerOptions;
use crate::resolve::DEFAULT_TERNARY_HELPER;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Lowering configuration. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LoweringConfig {
    /// Members carrying any of these annotations are dropped.
    pub excluded_annotations: Option<Vec<String>>,
    /// Name of the injected conditional helper.
    pub ternary_helper: Option<String>,
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Extension of written files, without the dot.
    pub extension: Option<String>,
    /// Go module path prefixed to cross-package imports.
    pub module: Option<String>,
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TranslateConfig {
    pub lowering: LoweringConfig,
    pub output: OutputConfig,
}

impl TranslateConfig {
    /// Load configuration for a project.
    ///
    /// Loads global config from ~/.config/javago/config.toml,
    /// then merges with per-project config from .javago/config.toml.
    pub fn load(root: &Path) -> Self {
        let mut config = Self::default();

        if let Some(global) = Self::global_config_path().and_then(|p| Self::load_file(&p)) {
            config = config.merge(global);
        }

        let project_path = root.join(".javago").join("config.toml");
        if let Some(project) = Self::load_file(&project_path) {
            config = config.merge(project);
        }

        config
    }

    /// Get the global config path.
    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("javago").join("config.toml"))
    }

    /// Load config from a file path. A missing file is silently skipped,
    /// a malformed one is skipped with a warning.
    fn load_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!(path = %path.display(), "ignoring malformed config: {err}");
                None
            }
        }
    }

    /// Merge another config into this one. Fields set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            lowering: LoweringConfig {
                excluded_annotations: other
                    .lowering
                    .excluded_annotations
                    .or(self.lowering.excluded_annotations),
                ternary_helper: other.lowering.ternary_helper.or(self.lowering.ternary_helper),
            },
            output: OutputConfig {
                extension: other.output.extension.or(self.output.extension),
                module: other.output.module.or(self.output.module),
            },
        }
    }

    pub fn excluded_annotations(&self) -> Vec<String> {
        self.lowering.excluded_annotations.clone().unwrap_or_default()
    }

    pub fn extension(&self) -> &str {
        self.output.extension.as_deref().unwrap_or("go")
    }

    /// Options for the lowering pass.
    pub fn lower_options(&self) -> LowerOptions {
        LowerOptions {
            ternary_helper: self
                .lowering
                .ternary_helper
                .clone()
                .unwrap_or_else(|| DEFAULT_TERNARY_HELPER.to_string()),
            module: self.output.module.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_project_config(dir: &TempDir, content: &str) {
        let config_dir = dir.path().join(".javago");
        std::fs::create_dir_all(&config_dir).unwrap();
        let mut file = std::fs::File::create(config_dir.join("config.toml")).unwrap();
        writeln!(file, "{content}").unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = TranslateConfig::default();
        assert_eq!(config.extension(), "go");
        assert!(config.excluded_annotations().is_empty());
        let options = config.lower_options();
        assert_eq!(options.ternary_helper, "ternary");
        assert_eq!(options.module, "");
    }

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        write_project_config(
            &dir,
            r#"
[lowering]
excluded_annotations = ["Ignore"]
ternary_helper = "cond"

[output]
module = "example.com/app"
"#,
        );

        let config = TranslateConfig::load(dir.path());
        assert_eq!(config.excluded_annotations(), vec!["Ignore".to_string()]);
        let options = config.lower_options();
        assert_eq!(options.ternary_helper, "cond");
        assert_eq!(options.module, "example.com/app");
        assert_eq!(config.extension(), "go");
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let global = TranslateConfig {
            lowering: LoweringConfig {
                excluded_annotations: Some(vec!["Ignore".into()]),
                ternary_helper: None,
            },
            output: OutputConfig {
                extension: Some("go.txt".into()),
                module: None,
            },
        };
        let project: TranslateConfig = toml::from_str("[output]\nmodule = \"m\"").unwrap();
        let merged = TranslateConfig::default().merge(global).merge(project);
        assert_eq!(merged.excluded_annotations(), vec!["Ignore".to_string()]);
        assert_eq!(merged.extension(), "go.txt");
        assert_eq!(merged.output.module.as_deref(), Some("m"));
    }

    #[test]
    fn test_malformed_config_is_ignored() {
        let dir = TempDir::new().unwrap();
        write_project_config(&dir, "[lowering\nbroken");
        let config = TranslateConfig::load(dir.path());
        assert_eq!(config.lower_options().ternary_helper, "ternary");
    }
}
