//! Sandboxed path resolution.
//!
//! Maps raw request paths onto files under a single root directory. Every
//! served path is guaranteed to be a strict descendant of its root after
//! canonicalization; anything else resolves to `None` and is answered 404.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Index document name, appended for directory targets.
pub(crate) const INDEX_FILE: &str = "index.html";

/// Resolve a raw URL path against a canonical root directory.
///
/// Percent-decodes and lexically normalizes the path, appends
/// [`INDEX_FILE`] for directory targets, and canonicalizes the result.
/// Returns `None` (never an outside path) when:
///
/// - decoding fails or a `..` segment survives normalization
/// - the target does not exist
/// - any component of the resolved path is a symbolic link, even one
///   whose target lies inside the root
/// - the canonical path is not a strict descendant of `root_real`
pub(crate) async fn resolve_file_path(root_real: &Path, url_path: &str) -> Option<PathBuf> {
    let (rel, is_dir_target) = sanitize_url_path(url_path)?;

    let mut candidate = root_real.join(rel);
    if is_dir_target {
        candidate.push(INDEX_FILE);
    }
    if let Ok(meta) = tokio::fs::metadata(&candidate).await
        && meta.is_dir()
    {
        candidate.push(INDEX_FILE);
    }

    let lmeta = tokio::fs::symlink_metadata(&candidate).await.ok()?;
    if lmeta.file_type().is_symlink() {
        return None;
    }

    let real = tokio::fs::canonicalize(&candidate).await.ok()?;
    // The root is already canonical, so any difference means a symlinked
    // intermediate component.
    if real != candidate {
        return None;
    }
    if real == root_real || !real.starts_with(root_real) {
        return None;
    }
    Some(real)
}

/// Decode and lexically normalize a URL path into a relative path.
///
/// Returns the normalized relative path and whether the request named a
/// directory (trailing slash). `None` means the path is malformed or
/// attempts to escape the root: a `..` segment that would climb past the
/// first component is rejected outright rather than clamped.
fn sanitize_url_path(url_path: &str) -> Option<(PathBuf, bool)> {
    let decoded = percent_decode_str(url_path).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }
    let is_dir_target = decoded.is_empty() || decoded.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    Some((segments.iter().collect(), is_dir_target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn root() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    async fn canonical(dir: &Path) -> PathBuf {
        tokio::fs::canonicalize(dir).await.unwrap()
    }

    #[test]
    fn test_sanitize_plain_path() {
        let (rel, dir) = sanitize_url_path("/a/b.txt").unwrap();

        assert_eq!(rel, PathBuf::from("a/b.txt"));
        assert!(!dir);
    }

    #[test]
    fn test_sanitize_collapses_dot_segments() {
        let (rel, _) = sanitize_url_path("/a/./b/../c").unwrap();

        assert_eq!(rel, PathBuf::from("a/c"));
    }

    #[test]
    fn test_sanitize_root_is_dir_target() {
        let (rel, dir) = sanitize_url_path("/").unwrap();

        assert_eq!(rel, PathBuf::new());
        assert!(dir);
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(sanitize_url_path("/../../etc/passwd").is_none());
        assert!(sanitize_url_path("/..").is_none());
        assert!(sanitize_url_path("/a/../..").is_none());
    }

    #[test]
    fn test_sanitize_rejects_encoded_traversal() {
        assert!(sanitize_url_path("/%2e%2e/secret").is_none());
        assert!(sanitize_url_path("/%2E%2E%2F%2E%2E%2Fetc/passwd").is_none());
    }

    #[test]
    fn test_sanitize_decodes_percent_encoding() {
        let (rel, _) = sanitize_url_path("/hello%20world.txt").unwrap();

        assert_eq!(rel, PathBuf::from("hello world.txt"));
    }

    #[tokio::test]
    async fn test_resolve_existing_file() {
        let dir = root();
        tokio::fs::write(dir.path().join("page.html"), "x")
            .await
            .unwrap();
        let real_root = canonical(dir.path()).await;

        let resolved = resolve_file_path(&real_root, "/page.html").await;

        assert_eq!(resolved, Some(real_root.join("page.html")));
    }

    #[tokio::test]
    async fn test_resolve_missing_file() {
        let dir = root();
        let real_root = canonical(dir.path()).await;

        assert_eq!(resolve_file_path(&real_root, "/missing.html").await, None);
    }

    #[tokio::test]
    async fn test_resolve_root_maps_to_index() {
        let dir = root();
        tokio::fs::write(dir.path().join(INDEX_FILE), "x")
            .await
            .unwrap();
        let real_root = canonical(dir.path()).await;

        let resolved = resolve_file_path(&real_root, "/").await;

        assert_eq!(resolved, Some(real_root.join(INDEX_FILE)));
    }

    #[tokio::test]
    async fn test_resolve_directory_maps_to_index() {
        let dir = root();
        tokio::fs::create_dir(dir.path().join("sub")).await.unwrap();
        tokio::fs::write(dir.path().join("sub").join(INDEX_FILE), "x")
            .await
            .unwrap();
        let real_root = canonical(dir.path()).await;

        let resolved = resolve_file_path(&real_root, "/sub").await;

        assert_eq!(resolved, Some(real_root.join("sub").join(INDEX_FILE)));
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal_even_when_target_exists() {
        let outer = root();
        let inner = outer.path().join("inner");
        tokio::fs::create_dir(&inner).await.unwrap();
        tokio::fs::write(outer.path().join("secret.txt"), "s")
            .await
            .unwrap();
        let real_root = canonical(&inner).await;

        assert_eq!(resolve_file_path(&real_root, "/../secret.txt").await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_rejects_symlink_inside_root() {
        let dir = root();
        tokio::fs::write(dir.path().join("real.html"), "x")
            .await
            .unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.html"), dir.path().join("link.html"))
            .unwrap();
        let real_root = canonical(dir.path()).await;

        // Rejected even though the target lies inside the root.
        assert_eq!(resolve_file_path(&real_root, "/link.html").await, None);
        assert!(
            resolve_file_path(&real_root, "/real.html")
                .await
                .is_some()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_rejects_symlinked_directory() {
        let dir = root();
        let sub = dir.path().join("sub");
        tokio::fs::create_dir(&sub).await.unwrap();
        tokio::fs::write(sub.join("page.html"), "x").await.unwrap();
        std::os::unix::fs::symlink(&sub, dir.path().join("alias")).unwrap();
        let real_root = canonical(dir.path()).await;

        assert_eq!(resolve_file_path(&real_root, "/alias/page.html").await, None);
    }

    #[tokio::test]
    async fn test_resolve_never_returns_root_itself() {
        let dir = root();
        let real_root = canonical(dir.path()).await;

        assert_eq!(resolve_file_path(&real_root, "/.").await, None);
    }
}
