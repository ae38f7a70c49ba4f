//! The canonical node tree shared by every input format.
//!
//! YAML files are already written in this shape. HTML fragments and Markdown
//! documents are converted into it by [`crate::markup`]. Once serialized, the
//! front-end runtime cannot tell which format a node came from.
//!
//! ```text
//! type: div
//! attributes:
//!   classes: [hero, wide]
//!   onClick: { action: navigate, to: /about }
//! body:
//!   - Hello
//!   - type: img
//!     attributes: { src: hero.png }
//! ```
//!
//! ## Omission Rules
//!
//! A node without children has no `body` key at all, and a node without
//! attributes has no `attributes` key. Absence is the signal; the runtime
//! never sees an empty list or an empty mapping.
//!
//! ## Attribute Handlers
//!
//! Which attributes get special treatment is decided by a single closed table,
//! [`AttrKind::classify`], evaluated once per attribute name. Both the markup
//! walker (class lists, JSON values) and the asset resolver (image references)
//! consult the same table.

use serde::Serialize;
use serde_json::{Map, Value};

/// Values starting with this prefix are template parameters, not file paths.
pub const COMPONENT_PARAM_PREFIX: &str = "Component.Param.";

/// Key under which normalized class lists are emitted.
pub const CLASSES_KEY: &str = "classes";

/// A canonical tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Tag name, `Component`/`View` for Markdown documents, `i18n` for the envelope.
    #[serde(rename = "type")]
    pub kind: String,
    /// Document name, only set on Markdown document wrappers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<Child>,
}

impl Node {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
            attributes: Map::new(),
            body: Vec::new(),
        }
    }

    /// Convert into the JSON value form used by the merged document.
    pub fn into_value(self) -> Value {
        // Only string keys and JSON values inside; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// One entry of a node's `body`: trimmed text or a nested node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Child {
    Text(String),
    Node(Node),
}

impl Child {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(n) => Some(n),
            Child::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Child::Text(t) => Some(t),
            Child::Node(_) => None,
        }
    }
}

/// How an attribute value is handled, decided by attribute name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    /// `class` / `classes`: normalized to a list of class names.
    Classes,
    /// Image reference: embedded or extracted by the asset resolver.
    Asset,
    /// Event handler payload: parsed as JSON when it parses, else kept raw.
    Json,
    /// Kept as-is, unless the raw text is JSON-shaped (object or array).
    Plain,
}

impl AttrKind {
    pub fn classify(name: &str) -> Self {
        match name {
            "class" | "classes" => AttrKind::Classes,
            "image" | "src" => AttrKind::Asset,
            // HTML parsing lowercases attribute names.
            "onClick" | "onclick" => AttrKind::Json,
            _ if name.ends_with("Image") || name.starts_with("Image") => AttrKind::Asset,
            _ => AttrKind::Plain,
        }
    }
}

/// Normalize a class value into an ordered list of class names.
///
/// Accepts a space-separated string, a JSON-array-shaped string, or a native
/// list. Anything else yields an empty list.
pub fn normalize_classes(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[')
                && let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed)
            {
                return class_names_from_list(&items);
            }
            trimmed.split_whitespace().map(str::to_string).collect()
        }
        Value::Array(items) => class_names_from_list(items),
        _ => Vec::new(),
    }
}

fn class_names_from_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Convert a raw attribute string into its canonical value for the given kind.
///
/// JSON parsing failures fall back to the raw string; they are never errors.
pub fn attribute_value(kind: AttrKind, raw: &str) -> Value {
    match kind {
        AttrKind::Classes => Value::Array(
            normalize_classes(&Value::String(raw.to_string()))
                .into_iter()
                .map(Value::String)
                .collect(),
        ),
        AttrKind::Json => parse_json_or_raw(raw),
        AttrKind::Plain if looks_like_json(raw) => parse_json_or_raw(raw),
        AttrKind::Plain | AttrKind::Asset => Value::String(raw.to_string()),
    }
}

fn looks_like_json(raw: &str) -> bool {
    let t = raw.trim();
    (t.starts_with('{') && t.ends_with('}')) || (t.starts_with('[') && t.ends_with(']'))
}

fn parse_json_or_raw(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
