//! Asset resolution: embedding images as data URLs or extracting them into a
//! content-addressed store.
//!
//! After the source files are merged, every field whose name marks it as an
//! image reference (see [`AttrKind::classify`]) is resolved relative to the
//! source root. There are two modes, chosen per run by [`AssetMode`]:
//!
//! - **Embed** (default): the file is read and the field becomes
//!   `data:<mime>;base64,<payload>`. The output document is self-contained.
//! - **Extract**: the file is copied into the assets directory under
//!   `<sha256><ext>` and the field becomes a public URL, either
//!   `<prefix>/<file>` or a path relative to the output document.
//!
//! ## Content Addressing
//!
//! The stored name is the SHA-256 of the raw bytes, so identical content
//! always lands at the same path no matter how many times or under which
//! names it is referenced. A file that already exists is never rewritten;
//! the directory is append-only and has no manifest, presence is membership.
//!
//! ## Atomic Writes
//!
//! Bytes are written to a temporary sibling and renamed into place. A crash
//! never leaves a truncated file under a content-addressed name, and the
//! temporary file is removed on every failure path (it is deleted on drop).
//! Two concurrent runs may both write the same file; the rename makes the
//! last one win with identical content.
//!
//! ## Skipped Values
//!
//! Only relative paths are resolved. Values starting with
//! [`COMPONENT_PARAM_PREFIX`], URLs (`scheme://…`, `//…`), site-absolute paths
//! (`/…`) and empty strings are left untouched. Existing `data:` URLs are left
//! alone when embedding and moved into the store when extracting.

use crate::node::{AttrKind, COMPONENT_PARAM_PREFIX};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataUrlError {
    #[error("not a data URL: missing 'data:' prefix")]
    MissingPrefix,
    #[error("invalid data URL: missing comma separator")]
    MissingComma,
    #[error("invalid base64 payload in data URL: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    DataUrl(#[from] DataUrlError),
    #[error("asset filename must be a non-empty string")]
    EmptyFilename,
    #[error("cannot express {asset} relative to {base}")]
    Unrelatable { asset: PathBuf, base: PathBuf },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> AssetError + '_ {
    move |source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Where extracted assets go and how their public URLs are built.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractTarget {
    pub assets_dir: PathBuf,
    /// Public URL prefix. When `None`, URLs are relative to `output_path`.
    pub prefix: Option<String>,
    /// Location of the output document, the anchor for relative URLs.
    pub output_path: PathBuf,
}

/// How asset references are resolved for one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AssetMode {
    #[default]
    Embed,
    Extract(ExtractTarget),
}

// ============================================================================
// MIME types and data URLs
// ============================================================================

const MIME_TO_EXT: &[(&str, &str)] = &[
    ("image/png", ".png"),
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/gif", ".gif"),
    ("image/svg+xml", ".svg"),
    ("image/webp", ".webp"),
    ("text/plain", ".txt"),
    ("text/css", ".css"),
    ("text/html", ".html"),
    ("application/json", ".json"),
    ("application/pdf", ".pdf"),
];

/// MIME type for an image file, from its extension.
///
/// `svg*` maps to `image/svg+xml`; everything else to `image/<ext>`. Files
/// without an extension are `application/octet-stream`.
pub fn mime_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext.is_empty() {
        "application/octet-stream".to_string()
    } else if ext.starts_with("svg") {
        "image/svg+xml".to_string()
    } else {
        format!("image/{ext}")
    }
}

/// Extension (with leading dot) for a stored asset.
///
/// Prefers the extension of `suggested_name`, then the MIME table. Returns an
/// empty string when neither yields one.
pub fn derive_extension(mime: &str, suggested_name: Option<&str>) -> String {
    if let Some(ext) = suggested_name
        .and_then(|n| Path::new(n).extension())
        .map(|e| e.to_string_lossy())
        .filter(|e| !e.is_empty())
    {
        return format!(".{ext}");
    }
    let mime = mime.to_ascii_lowercase();
    MIME_TO_EXT
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|(_, ext)| ext.to_string())
        .unwrap_or_default()
}

pub fn encode_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Decoded contents of a `data:` URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Parse `data:<mime>[;base64],<payload>`.
///
/// Base64 payloads must decode strictly; other payloads are percent-decoded.
pub fn parse_data_url(data_url: &str) -> Result<DataUrl, DataUrlError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or(DataUrlError::MissingPrefix)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingComma)?;

    let mut params = header.split(';');
    let mime = params.next().unwrap_or_default().to_string();
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        STANDARD.decode(payload)?
    } else {
        percent_decode_str(payload).collect()
    };
    Ok(DataUrl { mime, bytes })
}

/// Read a file and return it as a base64 data URL.
pub fn embed_file(path: &Path) -> Result<String, AssetError> {
    if !path.is_file() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(io_err(path))?;
    Ok(encode_data_url(&bytes, &mime_for_path(path)))
}

// ============================================================================
// Content-addressed store
// ============================================================================

/// SHA-256 of a byte buffer, as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Result of storing bytes in the assets directory.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAsset {
    pub path: PathBuf,
    /// `<sha256><ext>`, the name inside the assets directory.
    pub filename: String,
    /// False when a file with this name already existed.
    pub written: bool,
}

/// Store bytes under `<sha256><ext>` in `assets_dir`, writing at most once.
pub fn store_bytes(bytes: &[u8], assets_dir: &Path, ext: &str) -> Result<StoredAsset, AssetError> {
    fs::create_dir_all(assets_dir).map_err(io_err(assets_dir))?;

    let filename = format!("{}{}", sha256_hex(bytes), ext);
    let path = assets_dir.join(&filename);
    if path.exists() {
        return Ok(StoredAsset {
            path,
            filename,
            written: false,
        });
    }

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{filename}."))
        .suffix(".tmp")
        .tempfile_in(assets_dir)
        .map_err(io_err(assets_dir))?;
    tmp.write_all(bytes).map_err(io_err(tmp.path()))?;
    tmp.as_file().sync_all().map_err(io_err(tmp.path()))?;
    tmp.persist(&path).map_err(|e| AssetError::Io {
        path: path.clone(),
        source: e.error,
    })?;

    Ok(StoredAsset {
        path,
        filename,
        written: true,
    })
}

/// Decode a data URL and store its payload in `assets_dir`.
///
/// The extension comes from `suggested_name` when it has one, otherwise from
/// the data URL's MIME type. Idempotent: the same content always returns the
/// same path and is written once.
pub fn extract_data_url(
    data_url: &str,
    assets_dir: &Path,
    suggested_name: Option<&str>,
) -> Result<StoredAsset, AssetError> {
    let DataUrl { mime, bytes } = parse_data_url(data_url)?;
    let ext = derive_extension(&mime, suggested_name);
    store_bytes(&bytes, assets_dir, &ext)
}

/// Copy a source file into `assets_dir` under its content-addressed name.
pub fn extract_file(path: &Path, assets_dir: &Path) -> Result<StoredAsset, AssetError> {
    if !path.is_file() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(io_err(path))?;
    let ext = derive_extension(&mime_for_path(path), path.to_str());
    store_bytes(&bytes, assets_dir, &ext)
}

/// Build the public URL for an extracted asset.
///
/// With a prefix the URL is `<prefix>/<filename>` (one slash, trailing
/// slashes on the prefix dropped). Without one it is the path from the output
/// document's directory to `assets_dir/filename`, using forward slashes.
pub fn asset_url(
    filename: &str,
    output_path: &Path,
    assets_dir: &Path,
    prefix: Option<&str>,
) -> Result<String, AssetError> {
    if filename.is_empty() {
        return Err(AssetError::EmptyFilename);
    }

    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        return Ok(format!("{}/{}", prefix.trim_end_matches('/'), filename));
    }

    let output_abs = normalize(&std::path::absolute(output_path).map_err(io_err(output_path))?);
    let output_dir = output_abs.parent().unwrap_or(output_abs.as_path());
    let asset = assets_dir.join(filename);
    let asset_abs = normalize(&std::path::absolute(&asset).map_err(io_err(&asset))?);
    let rel = pathdiff::diff_paths(&asset_abs, output_dir).ok_or_else(|| AssetError::Unrelatable {
        asset: asset_abs.clone(),
        base: output_dir.to_path_buf(),
    })?;
    Ok(rel.to_string_lossy().replace('\\', "/"))
}

/// Lexically resolve `.` and `..` in an absolute path. `..` at the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other),
        }
    }
    out
}

// ============================================================================
// Tree resolution
// ============================================================================

/// Counts of what the resolver did during a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AssetStats {
    pub embedded: u32,
    pub written: u32,
    pub reused: u32,
}

impl AssetStats {
    fn record(&mut self, stored: &StoredAsset) {
        if stored.written {
            self.written += 1;
        } else {
            self.reused += 1;
        }
    }

    pub fn total(&self) -> u32 {
        self.embedded + self.written + self.reused
    }
}

impl fmt::Display for AssetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total() == 0 {
            return write!(f, "none");
        }
        if self.embedded > 0 {
            write!(f, "{} embedded", self.embedded)
        } else if self.reused > 0 {
            write!(
                f,
                "{} written, {} reused ({} total)",
                self.written,
                self.reused,
                self.total()
            )
        } else {
            write!(f, "{} written", self.written)
        }
    }
}

/// A value that is not a relative file path and must be left untouched.
fn is_passthrough(value: &str) -> bool {
    value.is_empty()
        || value.starts_with(COMPONENT_PARAM_PREFIX)
        || value.starts_with('/')
        || value.contains("://")
}

struct Resolver<'a> {
    base_dir: &'a Path,
    mode: &'a AssetMode,
    stats: AssetStats,
}

impl Resolver<'_> {
    /// New field value for one asset reference, or `None` to leave it.
    fn resolve_reference(&mut self, value: &str) -> Result<Option<String>, AssetError> {
        if is_passthrough(value) {
            return Ok(None);
        }
        let is_data_url = value.starts_with("data:");

        match self.mode {
            AssetMode::Embed if is_data_url => Ok(None),
            AssetMode::Embed => {
                let url = embed_file(&self.base_dir.join(value))?;
                self.stats.embedded += 1;
                tracing::debug!(reference = value, "embedded asset");
                Ok(Some(url))
            }
            AssetMode::Extract(target) => {
                let stored = if is_data_url {
                    extract_data_url(value, &target.assets_dir, None)?
                } else {
                    extract_file(&self.base_dir.join(value), &target.assets_dir)?
                };
                self.stats.record(&stored);
                tracing::debug!(
                    file = %stored.filename,
                    written = stored.written,
                    "extracted asset"
                );
                let url = asset_url(
                    &stored.filename,
                    &target.output_path,
                    &target.assets_dir,
                    target.prefix.as_deref(),
                )?;
                Ok(Some(url))
            }
        }
    }

    fn walk(&mut self, value: &mut Value) -> Result<(), AssetError> {
        match value {
            Value::Object(map) => {
                for (key, field) in map.iter_mut() {
                    match field {
                        Value::String(s) if AttrKind::classify(key) == AttrKind::Asset => {
                            if let Some(resolved) = self.resolve_reference(s)? {
                                *s = resolved;
                            }
                        }
                        other => self.walk(other)?,
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Resolve every asset reference in `nodes`, in place, depth-first.
///
/// Relative paths are resolved against `base_dir`. A missing file aborts the
/// whole run with [`AssetError::NotFound`].
pub fn resolve_assets(
    nodes: &mut [Value],
    base_dir: &Path,
    mode: &AssetMode,
) -> Result<AssetStats, AssetError> {
    let mut resolver = Resolver {
        base_dir,
        mode,
        stats: AssetStats::default(),
    };
    for node in nodes.iter_mut() {
        resolver.walk(node)?;
    }
    Ok(resolver.stats)
}
