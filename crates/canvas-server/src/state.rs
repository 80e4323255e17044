//! Application state.
//!
//! Shared state for all request handlers. Both roots are read-only from
//! the server's perspective after startup; the canvas root's *contents*
//! change externally, which is what the watcher observes.

use std::path::PathBuf;

use crate::live_reload::ReloadHub;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Canonical canvas root; every primary-subtree path resolves under it.
    pub(crate) root_real: PathBuf,
    /// Configured root path, as given by the caller (used in messages).
    pub(crate) root_display: PathBuf,
    /// Canonical UI asset root, resolved once at startup. `None` means the
    /// asset subtree answers 503.
    pub(crate) ui_root: Option<PathBuf>,
    /// Reload hub: debounce timer plus socket fan-out.
    pub(crate) reload: ReloadHub,
}
