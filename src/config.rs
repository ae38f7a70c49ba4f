//! Run configuration.
//!
//! Configuration is layered: stock defaults are overridden by an optional
//! `rune.toml` in the source root, which is in turn overridden by command-line
//! flags. The merged result is validated once and then passed explicitly to
//! every stage that needs it.
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! translations_dir = "translations"   # relative to the source root
//! component_suffix = ".component.md"  # marks Markdown components
//!
//! [assets]
//! # dir = "dist/assets"               # enables extract mode (relative to the source root)
//! # prefix = "/static"                # public URL prefix for extracted assets
//!
//! [markdown]
//! extensions = false                  # tables, strikethrough, footnotes, task lists
//! ```
//!
//! Unknown keys are rejected to catch typos early. Paths given on the command
//! line are relative to the working directory, not the source root.

use crate::assets::{AssetMode, ExtractTarget};
use crate::markup::MarkdownOptions;
use crate::scan::ScanOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional config file in the source root.
pub const CONFIG_FILENAME: &str = "rune.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration for one preprocessing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuneConfig {
    /// Directory holding `<basename>.<lang>.<ext>` translation files.
    pub translations_dir: String,
    /// File-name suffix that turns a Markdown document into a `Component`.
    pub component_suffix: String,
    /// Asset extraction settings. Without `dir`, assets are embedded.
    pub assets: AssetsConfig,
    pub markdown: MarkdownConfig,
}

impl Default for RuneConfig {
    fn default() -> Self {
        Self {
            translations_dir: "translations".to_string(),
            component_suffix: ".component.md".to_string(),
            assets: AssetsConfig::default(),
            markdown: MarkdownConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    pub extensions: bool,
}

impl RuneConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.translations_dir.is_empty() {
            return Err(ConfigError::Validation(
                "translations_dir must not be empty".into(),
            ));
        }
        if !self.component_suffix.ends_with(".md") || self.component_suffix == ".md" {
            return Err(ConfigError::Validation(
                "component_suffix must end in .md and be longer than .md".into(),
            ));
        }
        if self.assets.dir.as_deref() == Some("") {
            return Err(ConfigError::Validation(
                "assets.dir must not be empty".into(),
            ));
        }
        if self.assets.prefix.as_deref() == Some("") {
            return Err(ConfigError::Validation(
                "assets.prefix must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn translations_path(&self, root: &Path) -> PathBuf {
        root.join(&self.translations_dir)
    }

    /// Asset mode for a run whose output document is written to `output_path`.
    pub fn asset_mode(&self, root: &Path, output_path: &Path) -> AssetMode {
        match &self.assets.dir {
            Some(dir) => AssetMode::Extract(ExtractTarget {
                assets_dir: root.join(dir),
                prefix: self.assets.prefix.clone(),
                output_path: output_path.to_path_buf(),
            }),
            None => AssetMode::Embed,
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            component_suffix: self.component_suffix.clone(),
            markdown: MarkdownOptions {
                extensions: self.markdown.extensions,
            },
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub translations_dir: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub assets_prefix: Option<String>,
}

impl Overrides {
    /// Express the overrides as a TOML overlay.
    ///
    /// Paths are made absolute against the working directory so that joining
    /// them onto the source root leaves them unchanged.
    pub fn to_overlay(&self) -> Result<toml::Value, ConfigError> {
        let mut table = toml::Table::new();
        if let Some(dir) = &self.translations_dir {
            table.insert("translations_dir".into(), path_value(dir)?);
        }
        let mut assets = toml::Table::new();
        if let Some(dir) = &self.assets_dir {
            assets.insert("dir".into(), path_value(dir)?);
        }
        if let Some(prefix) = &self.assets_prefix {
            assets.insert("prefix".into(), toml::Value::String(prefix.clone()));
        }
        if !assets.is_empty() {
            table.insert("assets".into(), toml::Value::Table(assets));
        }
        Ok(toml::Value::Table(table))
    }
}

fn path_value(path: &Path) -> Result<toml::Value, ConfigError> {
    let abs = std::path::absolute(path)?;
    Ok(toml::Value::String(abs.to_string_lossy().to_string()))
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(RuneConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `rune.toml` from a directory as a raw TOML value, if present.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge layers in order onto the stock defaults, then deserialize and validate.
pub fn resolve_config(layers: Vec<toml::Value>) -> Result<RuneConfig, ConfigError> {
    let merged = layers
        .into_iter()
        .try_fold(stock_defaults_value()?, |acc, layer| {
            Ok::<_, ConfigError>(merge_toml(acc, layer))
        })?;
    let config: RuneConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config for a source root: defaults, `rune.toml`, then overrides.
pub fn load_config(root: &Path, overrides: &Overrides) -> Result<RuneConfig, ConfigError> {
    let mut layers = Vec::new();
    if let Some(file) = load_raw_config(root)? {
        layers.push(file);
    }
    layers.push(overrides.to_overlay()?);
    resolve_config(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = RuneConfig::default();
        assert_eq!(config.translations_dir, "translations");
        assert_eq!(config.component_suffix, ".component.md");
        assert_eq!(config.assets, AssetsConfig::default());
        assert!(!config.markdown.extensions);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(RuneConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let config: RuneConfig = toml::from_str("[assets]\nprefix = \"/static\"\n").unwrap();
        assert_eq!(config.assets.prefix.as_deref(), Some("/static"));
        assert_eq!(config.assets.dir, None);
        assert_eq!(config.translations_dir, "translations");
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<RuneConfig, _> = toml::from_str("unknown = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<RuneConfig, _> = toml::from_str("[assets]\ndirectory = \"x\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Layering
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path(), &Overrides::default()).unwrap();
        assert_eq!(config, RuneConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "component_suffix = \".Component.md\"\n[markdown]\nextensions = true\n",
        )
        .unwrap();

        let config = load_config(tmp.path(), &Overrides::default()).unwrap();
        assert_eq!(config.component_suffix, ".Component.md");
        assert!(config.markdown.extensions);
        assert_eq!(config.translations_dir, "translations");
    }

    #[test]
    fn cli_overrides_win_over_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[assets]\ndir = \"from-file\"\nprefix = \"/file\"\n",
        )
        .unwrap();
        let overrides = Overrides {
            assets_prefix: Some("/cli".into()),
            ..Default::default()
        };

        let config = load_config(tmp.path(), &overrides).unwrap();
        assert_eq!(config.assets.prefix.as_deref(), Some("/cli"));
        assert_eq!(config.assets.dir.as_deref(), Some("from-file"));
    }

    #[test]
    fn cli_paths_are_absolute() {
        let tmp = TempDir::new().unwrap();
        let overrides = Overrides {
            assets_dir: Some(PathBuf::from("out/assets")),
            translations_dir: Some(PathBuf::from("lang")),
            ..Default::default()
        };
        let config = load_config(tmp.path(), &overrides).unwrap();

        let assets = PathBuf::from(config.assets.dir.as_deref().unwrap());
        assert!(assets.is_absolute());
        assert!(assets.ends_with("out/assets"));
        // Joining onto the root keeps an absolute path intact
        let translations = config.translations_path(tmp.path());
        assert_eq!(translations, std::env::current_dir().unwrap().join("lang"));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "not valid [[[").unwrap();
        let result = load_config(tmp.path(), &Overrides::default());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "component_suffix = \".txt\"\n").unwrap();
        let result = load_config(tmp.path(), &Overrides::default());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let overrides = Overrides {
            assets_prefix: Some(String::new()),
            ..Default::default()
        };
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_config(tmp.path(), &overrides),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("a = 1\n[t]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn empty_overrides_are_empty_table() {
        let overlay = Overrides::default().to_overlay().unwrap();
        assert_eq!(overlay, toml::Value::Table(toml::Table::new()));
    }

    // =========================================================================
    // Derived settings
    // =========================================================================

    #[test]
    fn asset_mode_defaults_to_embed() {
        let mode = RuneConfig::default().asset_mode(Path::new("/src"), Path::new("/out/d.json"));
        assert_eq!(mode, AssetMode::Embed);
    }

    #[test]
    fn asset_mode_extract_relative_to_root() {
        let mut config = RuneConfig::default();
        config.assets.dir = Some("public/assets".into());
        config.assets.prefix = Some("/a".into());
        let mode = config.asset_mode(Path::new("/src"), Path::new("/out/d.json"));
        assert_eq!(
            mode,
            AssetMode::Extract(ExtractTarget {
                assets_dir: PathBuf::from("/src/public/assets"),
                prefix: Some("/a".into()),
                output_path: PathBuf::from("/out/d.json"),
            })
        );
    }

    #[test]
    fn effective_config_prints_as_toml() {
        let text = RuneConfig::default().to_toml().unwrap();
        let back: RuneConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, RuneConfig::default());
    }
}
