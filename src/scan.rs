//! Source aggregation.
//!
//! Stage 1 of the pipeline. Lists the source root (not recursively) and turns
//! every recognized file into canonical nodes:
//!
//! ```text
//! site/
//! ├── 010-header.yml          # YAML list of nodes, spliced in as-is
//! ├── 020-pages.yml
//! ├── footer.html             # HTML fragment, one node per top-level element
//! ├── about.md                # → { type: View, name: about, body: [...] }
//! ├── card.component.md       # → { type: Component, name: card, body: [...] }
//! ├── logo.png                # referenced assets live alongside
//! └── translations/           # handled by the i18n module
//! ```
//!
//! ## Ordering
//!
//! The merged sequence is all YAML contributions, then all HTML, then all
//! Markdown. Within each group files are taken in lexicographic file-name
//! order, so the output does not depend on filesystem listing order. Each
//! file's contribution is flattened in place.
//!
//! ## Validation
//!
//! - A YAML file must hold a list at its root (an empty file contributes nothing)
//! - HTML and Markdown must produce well-formed markup
//!
//! Hidden files (names starting with `.`) are never read, in the source root
//! or in the translations directory.
//!
//! Finding no recognized files is not an error: a warning is logged and the
//! result is empty.

use crate::markup::{self, MarkdownOptions, ParseError};
use crate::node::Child;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory listing error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("YAML file {path} is not valid YAML: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },
    #[error("YAML file {0} does not contain a list at the root level")]
    NotAList(PathBuf),
    #[error("Failed to parse {path}: {source}")]
    Markup {
        path: PathBuf,
        source: ParseError,
    },
}

/// Settings that affect how source files are interpreted.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// File-name suffix that marks a Markdown document as a component.
    pub component_suffix: String,
    pub markdown: MarkdownOptions,
}

/// Recognized source files, grouped by format, each group sorted by name.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SourceFiles {
    pub yaml: Vec<PathBuf>,
    pub html: Vec<PathBuf>,
    pub markdown: Vec<PathBuf>,
}

impl SourceFiles {
    pub fn total(&self) -> usize {
        self.yaml.len() + self.html.len() + self.markdown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Output of the scan stage.
#[derive(Debug)]
pub struct Scan {
    pub nodes: Vec<Value>,
    pub sources: SourceFiles,
}

/// Regular, non-hidden files directly inside `dir`, sorted by file name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        // Dotfiles are editor swap files, `._*` resource forks and the like.
        if entry.file_name().to_string_lossy().starts_with('.') {
            tracing::debug!(file = %entry.path().display(), "skipping hidden file");
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Group the recognized files of `root` by format.
pub fn collect_sources(root: &Path) -> Result<SourceFiles, ScanError> {
    let mut sources = SourceFiles::default();
    for path in list_files(root)? {
        if has_extension(&path, "yml") {
            sources.yaml.push(path);
        } else if has_extension(&path, "html") {
            sources.html.push(path);
        } else if has_extension(&path, "md") {
            sources.markdown.push(path);
        }
    }
    Ok(sources)
}

pub fn scan(root: &Path, options: &ScanOptions) -> Result<Scan, ScanError> {
    let sources = collect_sources(root)?;
    if sources.is_empty() {
        tracing::warn!(
            dir = %root.display(),
            "no .yml, .html or .md files found"
        );
    }

    let mut nodes = Vec::new();
    for path in &sources.yaml {
        nodes.extend(load_yaml(path)?);
    }
    for path in &sources.html {
        nodes.extend(load_html(path)?);
    }
    for path in &sources.markdown {
        nodes.push(load_markdown(path, options)?);
    }

    Ok(Scan { nodes, sources })
}

/// Load a YAML node list. Node content is not interpreted.
pub fn load_yaml(path: &Path) -> Result<Vec<Value>, ScanError> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value =
        serde_yaml_ng::from_str(&content).map_err(|source| ScanError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
    let nodes = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        _ => return Err(ScanError::NotAList(path.to_path_buf())),
    };
    tracing::debug!(file = %path.display(), nodes = nodes.len(), "loaded yaml");
    Ok(nodes)
}

/// Load an HTML fragment: one node per top-level element.
pub fn load_html(path: &Path) -> Result<Vec<Value>, ScanError> {
    let content = fs::read_to_string(path)?;
    let children = markup::parse_html(&content).map_err(|source| ScanError::Markup {
        path: path.to_path_buf(),
        source,
    })?;

    let mut nodes = Vec::new();
    for child in children {
        match child {
            Child::Node(node) => nodes.push(node.into_value()),
            Child::Text(text) => {
                tracing::warn!(file = %path.display(), text = %text, "dropping top-level text");
            }
        }
    }
    tracing::debug!(file = %path.display(), nodes = nodes.len(), "loaded html");
    Ok(nodes)
}

/// Load a Markdown document as a single `Component` or `View` node.
pub fn load_markdown(path: &Path, options: &ScanOptions) -> Result<Value, ScanError> {
    let content = fs::read_to_string(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let doc = markup::parse_markdown_document(
        &file_name,
        &content,
        &options.component_suffix,
        options.markdown,
    )
    .map_err(|source| ScanError::Markup {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(file = %file_name, kind = %doc.kind, "loaded markdown");
    Ok(doc.into_value())
}
