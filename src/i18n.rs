//! Translation aggregation.
//!
//! Translation files live in one directory (by default `translations/` under
//! the source root) and are named `<basename>.<lang>.<ext>`:
//!
//! ```text
//! translations/
//! ├── app.en.json       → en
//! ├── app.fi.json       → fi
//! └── errors.en.yml     → en (merged over app.en.json)
//! ```
//!
//! Files sharing a language code are merged in lexicographic file-name order;
//! on a duplicate key the later file wins. Names with fewer than three
//! dot-delimited segments are skipped. Only aggregation happens here; key
//! lookup and interpolation belong to the front-end runtime.

use crate::naming;
use crate::scan::list_files;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Language code → flat key/value mapping.
pub type TranslationMap = BTreeMap<String, Map<String, Value>>;

const TRANSLATION_EXTENSIONS: &[&str] = &["json", "yml", "yaml"];

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory listing error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Translation file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Translation file {path} is not valid YAML: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },
    #[error("Translation file {0} does not contain a mapping at the root level")]
    Format(PathBuf),
}

fn is_translation_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| TRANSLATION_EXTENSIONS.contains(&e.as_str()))
}

/// Read one translation file and return its root mapping.
pub fn load_translation_file(path: &Path) -> Result<Map<String, Value>, TranslationError> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let value: Value = if is_json {
        serde_json::from_str(&content).map_err(|source| TranslationError::Json {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_yaml_ng::from_str(&content).map_err(|source| TranslationError::Yaml {
            path: path.to_path_buf(),
            source,
        })?
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(TranslationError::Format(path.to_path_buf())),
    }
}

/// Merge every translation file in `language_dir` by language code.
///
/// A missing directory, or one with no qualifying files, yields an empty map
/// and a warning; it is not an error.
pub fn aggregate(language_dir: &Path) -> Result<TranslationMap, TranslationError> {
    let mut translations = TranslationMap::new();

    if !language_dir.is_dir() {
        tracing::warn!(
            dir = %language_dir.display(),
            "translation directory not found, continuing without translations"
        );
        return Ok(translations);
    }

    for path in list_files(language_dir)? {
        if !is_translation_file(&path) {
            continue;
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let Some(lang) = naming::parse_language_code(&file_name) else {
            tracing::debug!(file = %file_name, "skipping translation file without language code");
            continue;
        };

        let entries = load_translation_file(&path)?;
        tracing::debug!(file = %file_name, lang, keys = entries.len(), "loaded translations");
        translations.entry(lang.to_string()).or_default().extend(entries);
    }

    if translations.is_empty() {
        tracing::warn!(
            dir = %language_dir.display(),
            "no translation files found"
        );
    }

    Ok(translations)
}
