//! Server error types.

/// Errors that abort canvas host startup.
///
/// Per-request failures never surface here; they are caught at the
/// handler boundary and answered with an HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// The listener could not be acquired. Fatal, no retry.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// The bind host/port did not form a valid socket address.
    #[error("invalid bind address: {0}")]
    Addr(String),
    /// Root directory could not be created or canonicalized.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file watcher could not be started.
    #[error("file watcher error: {0}")]
    Watcher(#[from] notify::Error),
}
