//! Shared test utilities.
//!
//! `fixtures/content/` is a small project exercising every source format:
//!
//! ```text
//! 010-header.yml      Header with a Component.Param placeholder image
//! 020-home.yml        Hero (image: logo.png) + Footer
//! about.md            View "about"
//! card.component.md   Component "card" with ![Logo](logo.png)
//! footer.html         <footer> with <img src="logo.png"/>
//! logo.png            1x1 PNG, see TINY_PNG_BASE64
//! translations/       app.en.json, app.fi.json, overrides.en.yml
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::scan::ScanOptions;

/// A valid 1x1 grayscale PNG.
pub const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR4nGMAAQAABQABDQottAAAAABJRU5ErkJggg==";

pub fn tiny_png() -> Vec<u8> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(TINY_PNG_BASE64)
        .unwrap()
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Scan options from the stock configuration.
pub fn scan_options() -> ScanOptions {
    crate::config::RuneConfig::default().scan_options()
}
