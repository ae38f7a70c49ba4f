//! Serialization of the merged document, and the run summary.
//!
//! The document goes to stdout (or `--output`); everything meant for humans
//! goes to stderr so the two never mix in a pipe.
//!
//! # Architecture
//!
//! [`render`] and [`format_summary`] are pure and return strings for
//! testability. [`write_document`] and [`print_summary`] are the thin I/O
//! wrappers used by the binary.
//!
//! ```text
//! Sources: 2 yml, 1 html, 2 md
//! Nodes: 6
//! Languages: en, fi
//! Assets: 1 written, 2 reused (3 total)
//! ```

use crate::pipeline::Build;
use serde_json::Value;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("JSON serialize error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML serialize error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yml,
}

/// Render the document in the requested format, newline-terminated.
pub fn render(document: &[Value], format: OutputFormat) -> Result<String, OutputError> {
    let mut text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(document)?,
        OutputFormat::Yml => serde_yaml_ng::to_string(document)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Write rendered output to `path`, or to stdout when `None`.
pub fn write_document(rendered: &str, path: Option<&Path>) -> Result<(), OutputError> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, rendered)?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Human-readable summary lines for a finished run.
pub fn format_summary(build: &Build) -> Vec<String> {
    let languages = if build.languages.is_empty() {
        "none".to_string()
    } else {
        build.languages.join(", ")
    };
    vec![
        format!(
            "Sources: {} yml, {} html, {} md",
            build.sources.yaml.len(),
            build.sources.html.len(),
            build.sources.markdown.len()
        ),
        format!("Nodes: {}", build.node_count()),
        format!("Languages: {languages}"),
        format!("Assets: {}", build.assets),
    ]
}

/// Emit the summary as `info` events on stderr.
pub fn print_summary(build: &Build) {
    for line in format_summary(build) {
        tracing::info!("{line}");
    }
}
