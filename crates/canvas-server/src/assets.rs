//! Bundled UI asset discovery.
//!
//! The canvas host serves a read-only bundle of UI assets under a reserved
//! path prefix. Where that bundle lives depends on how the binary was
//! installed, so startup probes an ordered list of candidate directories
//! and takes the first one that contains both required files. The search
//! runs once; absence is non-fatal and only affects the asset subtree.

use std::path::{Path, PathBuf};

/// Index document required in the UI asset directory.
pub(crate) const UI_INDEX: &str = "index.html";

/// Script bundle required in the UI asset directory.
pub(crate) const UI_BUNDLE: &str = "ui.bundle.js";

/// Candidate UI asset directories, in priority order.
///
/// Covers the install layouts we actually see: next to the running
/// executable, a source checkout, and the current working directory
/// (plain and packaged output).
pub fn ui_root_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        candidates.push(dir.join("ui"));
    }

    // Running from a source checkout.
    candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("ui"));

    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("ui"));
        candidates.push(cwd.join("dist").join("ui"));
    }

    candidates
}

/// Return the first candidate containing both [`UI_INDEX`] and [`UI_BUNDLE`].
///
/// Pure ordered search over the supplied list; `None` means the asset
/// subtree will answer 503.
#[must_use]
pub fn locate_ui_root(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|dir| dir.join(UI_INDEX).is_file() && dir.join(UI_BUNDLE).is_file())
        .cloned()
}

/// MIME type for a file path, as detected by the generic detector.
///
/// The content server overrides this to `text/html` for HTML extensions
/// so injected content is always treated as HTML.
pub(crate) fn mime_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}
