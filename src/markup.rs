//! Markup tree parser shared by the HTML and Markdown paths.
//!
//! Both formats reduce to the same walk:
//!
//! ```text
//! HTML fragment ──────────────┐
//!                             ├─→ HTML5 fragment parse (body context) → Markup tree → canonical Node
//! Markdown → CommonMark HTML ─┘
//! ```
//!
//! The [`Markup`] tree is a format-agnostic intermediate: a tag name, the
//! attributes in document order, and ordered children that are either text or
//! nested elements. [`parse`] turns one such element into a canonical
//! [`Node`](crate::node::Node), trimming text, dropping whitespace-only runs,
//! and omitting `body` when nothing survives.
//!
//! ## Strictness
//!
//! Fragments are parsed with `html5ever`, so ordinary HTML (void elements,
//! named entities, unquoted and boolean attributes) is accepted. Anything the
//! HTML5 parser reports as a parse error fails the file with
//! [`ParseError::Malformed`] instead of being silently repaired. Tag and
//! attribute names come out lowercased, as HTML defines them.

use crate::naming::{self, DocumentName};
use crate::node::{AttrKind, CLASSES_KEY, Child, Node, attribute_value};
use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, QualName, local_name, namespace_url, ns};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use pulldown_cmark::{Options, Parser, html as md_html};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed markup: {}", .0.join("; "))]
    Malformed(Vec<String>),
    #[error("element missing identity")]
    MissingIdentity,
    #[error("in {element}: {source}")]
    Element {
        element: String,
        #[source]
        source: Box<ParseError>,
    },
}

/// A parsed markup node, independent of the parser that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Markup {
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Tag name. `None` (or empty) means the element cannot be identified.
    pub tag: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Markup>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn child(mut self, child: Markup) -> Self {
        self.children.push(child);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.child(Markup::Text(text.to_string()))
    }

    fn identity(&self) -> Option<&str> {
        self.tag.as_deref().filter(|t| !t.is_empty())
    }

    /// Short description used in error context: `<tag id="…">`.
    fn describe(&self) -> String {
        let tag = self.identity().unwrap_or("?");
        match self.attributes.iter().find(|(k, _)| k == "id") {
            Some((_, id)) => format!("<{tag} id=\"{id}\">"),
            None => format!("<{tag}>"),
        }
    }
}

/// Parse one markup node into a canonical child.
///
/// Text is trimmed; whitespace-only text yields `Ok(None)`. Elements become
/// nodes with normalized attributes and recursively parsed children.
pub fn parse(markup: &Markup) -> Result<Option<Child>, ParseError> {
    match markup {
        Markup::Text(text) => Ok(parse_text(text).map(Child::Text)),
        Markup::Element(el) => parse_element(el).map(|n| Some(Child::Node(n))),
    }
}

fn parse_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse one element into a canonical node.
///
/// Failures inside a child are wrapped in [`ParseError::Element`] naming this
/// element, so a deep failure carries its full ancestry.
pub fn parse_element(el: &Element) -> Result<Node, ParseError> {
    let tag = el.identity().ok_or(ParseError::MissingIdentity)?;
    let mut node = Node::new(tag);

    for (name, raw) in &el.attributes {
        let kind = AttrKind::classify(name);
        let key = match kind {
            AttrKind::Classes => CLASSES_KEY.to_string(),
            _ => name.clone(),
        };
        node.attributes.insert(key, attribute_value(kind, raw));
    }

    for child in &el.children {
        let parsed = parse(child).map_err(|e| ParseError::Element {
            element: el.describe(),
            source: Box::new(e),
        })?;
        if let Some(c) = parsed {
            node.body.push(c);
        }
    }

    Ok(node)
}

/// Parse an HTML fragment (zero or more sibling elements) into markup trees.
///
/// The fragment is parsed as if it were the content of `<body>`. Comments,
/// doctypes and processing instructions are dropped.
pub fn parse_fragment(source: &str) -> Result<Vec<Markup>, ParseError> {
    let context = QualName::new(None, ns!(html), local_name!("body"));
    let dom = html5ever::parse_fragment(RcDom::default(), ParseOpts::default(), context, vec![])
        .one(source);

    if !dom.errors.is_empty() {
        return Err(ParseError::Malformed(
            dom.errors.iter().map(|e| e.to_string()).collect(),
        ));
    }

    // The fragment parser hangs its output under a synthetic <html> root.
    let document = dom.document.children.borrow();
    let Some(root) = document.first() else {
        return Ok(Vec::new());
    };
    let children = root.children.borrow();
    Ok(children.iter().filter_map(convert).collect())
}

fn convert(handle: &Handle) -> Option<Markup> {
    match &handle.data {
        NodeData::Text { contents } => Some(Markup::Text(contents.borrow().to_string())),
        NodeData::Element { name, attrs, .. } => Some(Markup::Element(Element {
            tag: Some(name.local.to_string()),
            attributes: attrs
                .borrow()
                .iter()
                .map(|a| {
                    let key = match &a.name.prefix {
                        Some(prefix) => format!("{prefix}:{}", a.name.local),
                        None => a.name.local.to_string(),
                    };
                    (key, a.value.to_string())
                })
                .collect(),
            children: handle.children.borrow().iter().filter_map(convert).collect(),
        })),
        _ => None,
    }
}

/// Parse an HTML fragment into canonical children.
pub fn parse_html(source: &str) -> Result<Vec<Child>, ParseError> {
    let mut out = Vec::new();
    for markup in parse_fragment(source)? {
        if let Some(child) = parse(&markup)? {
            out.push(child);
        }
    }
    Ok(out)
}

/// Options for rendering Markdown to HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownOptions {
    /// Enable tables, strikethrough, footnotes and task lists on top of CommonMark.
    pub extensions: bool,
}

/// Render Markdown to an HTML fragment.
pub fn render_markdown(source: &str, options: MarkdownOptions) -> String {
    let mut opts = Options::empty();
    if options.extensions {
        opts.insert(Options::ENABLE_TABLES);
        opts.insert(Options::ENABLE_STRIKETHROUGH);
        opts.insert(Options::ENABLE_FOOTNOTES);
        opts.insert(Options::ENABLE_TASKLISTS);
    }
    let parser = Parser::new_ext(source, opts);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}

/// Convert a Markdown document into its `Component`/`View` wrapper node.
pub fn parse_markdown_document(
    file_name: &str,
    source: &str,
    component_suffix: &str,
    options: MarkdownOptions,
) -> Result<Node, ParseError> {
    let DocumentName { kind, name } = naming::parse_document_name(file_name, component_suffix);
    let html = render_markdown(source, options);
    let mut doc = Node::new(kind.node_type());
    doc.name = Some(name);
    doc.body = parse_html(&html)?;
    Ok(doc)
}
