//! Run orchestration.
//!
//! ```text
//! scan (yml → html → md)  →  resolve assets  →  aggregate translations  →  append i18n envelope
//! ```
//!
//! Every stage is synchronous and runs to completion before the next starts.
//! Any error aborts the run before anything is rendered, so a failed run
//! never produces a partial document.

use crate::assets::{self, AssetError, AssetStats};
use crate::config::RuneConfig;
use crate::i18n::{self, TranslationError, TranslationMap};
use crate::scan::{self, ScanError, SourceFiles};
use serde_json::{Value, json};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Translation(#[from] TranslationError),
}

/// Result of a complete run.
#[derive(Debug)]
pub struct Build {
    /// Canonical nodes, terminated by the `i18n` envelope node.
    pub document: Vec<Value>,
    pub sources: SourceFiles,
    /// Language codes present in the envelope, sorted.
    pub languages: Vec<String>,
    pub assets: AssetStats,
}

impl Build {
    /// Number of content nodes, excluding the envelope.
    pub fn node_count(&self) -> usize {
        self.document.len().saturating_sub(1)
    }
}

/// The trailing pseudo-node carrying every translation.
pub fn i18n_envelope(translations: TranslationMap) -> Value {
    json!({
        "type": "i18n",
        "data": translations,
    })
}

/// Run the full pipeline over `root`.
///
/// `output_path` is where the rendered document will be written; it anchors
/// relative asset URLs in extract mode.
pub fn build(root: &Path, config: &RuneConfig, output_path: &Path) -> Result<Build, BuildError> {
    let scan = scan::scan(root, &config.scan_options())?;
    let mut document = scan.nodes;

    let mode = config.asset_mode(root, output_path);
    let asset_stats = assets::resolve_assets(&mut document, root, &mode)?;

    let translations = i18n::aggregate(&config.translations_path(root))?;
    let languages = translations.keys().cloned().collect();
    document.push(i18n_envelope(translations));

    Ok(Build {
        document,
        sources: scan.sources,
        languages,
        assets: asset_stats,
    })
}
