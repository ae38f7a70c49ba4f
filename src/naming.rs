//! Centralized filename conventions.
//!
//! Two kinds of files carry meaning in their names:
//!
//! - **Markdown documents**: `card.component.md` becomes a `Component` named
//!   `card`; any other `about.md` becomes a `View` named `about`. The
//!   component marker suffix is configurable.
//! - **Translation files**: `<basename>.<lang>.<ext>`, e.g. `app.en.json`.
//!   The language code is the second-to-last dot-delimited segment.

/// Whether a Markdown document is a reusable component or a routed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Component,
    View,
}

impl DocumentKind {
    /// Node type emitted for the document wrapper.
    pub fn node_type(self) -> &'static str {
        match self {
            DocumentKind::Component => "Component",
            DocumentKind::View => "View",
        }
    }
}

/// Result of parsing a Markdown document file name.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentName {
    pub kind: DocumentKind,
    /// File name with the component suffix (or plain `.md`) stripped.
    pub name: String,
}

/// Parse a Markdown file name against the component marker suffix.
///
/// Suffixes match ASCII case-insensitively, like the `.md` extension check
/// in the scanner.
///
/// - `"card.component.md"` → Component `card`
/// - `"about.md"` → View `about`
/// - `"ABOUT.MD"` → View `ABOUT`
/// - `"notes"` → View `notes` (no extension to strip)
pub fn parse_document_name(file_name: &str, component_suffix: &str) -> DocumentName {
    if let Some(stem) = strip_suffix_ignore_case(file_name, component_suffix) {
        return DocumentName {
            kind: DocumentKind::Component,
            name: stem.to_string(),
        };
    }
    DocumentName {
        kind: DocumentKind::View,
        name: strip_suffix_ignore_case(file_name, ".md")
            .unwrap_or(file_name)
            .to_string(),
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = s.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}

/// Extract the language code from a translation file name.
///
/// Requires at least three dot-delimited segments (`<basename>.<lang>.<ext>`);
/// shorter names yield `None` and are skipped by the aggregator.
///
/// - `"app.en.json"` → `Some("en")`
/// - `"site.errors.fi.yml"` → `Some("fi")`
/// - `"en.json"` → `None`
pub fn parse_language_code(file_name: &str) -> Option<&str> {
    let mut segments = file_name.rsplit('.');
    let _ext = segments.next()?;
    let lang = segments.next()?;
    // A basename segment must precede the language code.
    segments.next()?;
    Some(lang)
}
