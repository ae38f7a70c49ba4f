//! # Rune
//!
//! A build-time content preprocessor. Rune reads a project directory of
//! YAML node lists, HTML fragments and Markdown documents, normalizes all of
//! them into one canonical tree of nodes, resolves image references, folds in
//! per-language translation files and prints the result as JSON or YAML for a
//! front-end runtime.
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan      site/*.yml, *.html, *.md  →  canonical nodes   (format → tree)
//! 2. Assets    nodes                     →  nodes             (paths → data URLs or public URLs)
//! 3. i18n      site/translations/        →  trailing `i18n` node
//! 4. Output    nodes                     →  JSON | YAML on stdout
//! ```
//!
//! The run is single-threaded and single-pass. Nothing is written until every
//! stage has succeeded, apart from content-addressed asset files, which are
//! complete and immutable once they exist.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`node`] | Canonical node type and the attribute-handler table |
//! | [`markup`] | Markup tree parser shared by HTML and Markdown |
//! | [`naming`] | Document and translation file-name conventions |
//! | [`scan`] | Stage 1: lists the source root and merges every file's nodes |
//! | [`assets`] | Stage 2: data URLs, content-addressed store, public URLs |
//! | [`i18n`] | Stage 3: merges translation files per language |
//! | [`pipeline`] | Runs the stages in order and appends the `i18n` envelope |
//! | [`config`] | Layered `rune.toml` + command-line configuration |
//! | [`output`] | JSON/YAML rendering and the run summary |
//!
//! # Design Decisions
//!
//! ## One Tree for Three Formats
//!
//! Markdown is rendered to HTML first and then goes through the same markup
//! walker as hand-written HTML. There is one code path for markup, so a
//! Markdown `![img](a.png)` and an HTML `<img src="a.png"/>` resolve
//! identically.
//!
//! ## Strict Markup
//!
//! Fragments go through a standards-compliant HTML5 parser. Anything it
//! reports as a parse error fails the run with the file name instead of being
//! silently repaired into a different tree.
//!
//! ## Deterministic Order
//!
//! Files are processed in lexicographic name order, not directory-listing
//! order, so merge order and last-writer-wins translation overrides are the
//! same on every platform.
//!
//! ## Content-Addressed Assets
//!
//! Extracted assets are named by the SHA-256 of their bytes. Re-running the
//! pipeline never rewrites an existing file, identical images referenced from
//! different places share one file, and the assets directory can be cached or
//! deployed incrementally without a manifest.

pub mod assets;
pub mod config;
pub mod i18n;
pub mod markup;
pub mod naming;
pub mod node;
pub mod output;
pub mod pipeline;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
