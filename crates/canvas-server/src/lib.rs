//! Canvas host: a local HTTP + WebSocket server for a user-writable
//! content directory.
//!
//! Serves two roots:
//! - the **canvas root** (user-writable, watched for changes), and
//! - a **UI asset root** (bundled, read-only) under [`UI_PREFIX`].
//!
//! Every HTML response gets a live-reload/native-bridge script injected;
//! file changes under the canvas root push a `"reload"` text frame to all
//! sockets connected on [`WS_PATH`].
//!
//! # Quick Start
//!
//! ```ignore
//! use canvas_server::{CanvasHostOpts, start};
//!
//! #[tokio::main]
//! async fn main() {
//!     let host = start(CanvasHostOpts::default()).await.unwrap();
//!     println!("listening on port {}", host.port());
//!     // ... later:
//!     host.close().await;
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Client ──HTTP──► axum router
//!                    ├─► /__canvas/ws        WebSocket (reload push)
//!                    ├─► /__canvas__/ui/*    UI asset root (or 503)
//!                    └─► /*                  canvas root (sandboxed resolve
//!                                            + HTML injection)
//!                    ▲
//!                    └── notify watcher ─► debounce ─► broadcast
//! ```

mod app;
mod assets;
mod content;
mod error;
mod inject;
mod live_reload;
mod resolve;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub use assets::{locate_ui_root, ui_root_candidates};
pub use error::StartError;
pub use inject::inject_live_reload;

use live_reload::{CanvasWatcher, ReloadHub};
use state::AppState;

/// Fixed WebSocket upgrade path.
pub const WS_PATH: &str = "/__canvas/ws";

/// Reserved prefix for the bundled UI asset subtree.
pub const UI_PREFIX: &str = "/__canvas__/ui";

/// Canvas host startup options.
#[derive(Clone, Debug, Default)]
pub struct CanvasHostOpts {
    /// Canvas root override (default: `~/canvas`).
    pub root_dir: Option<PathBuf>,
    /// Listen port (0 = OS-assigned ephemeral port).
    pub port: u16,
    /// Bind host (default: all interfaces).
    pub host: Option<String>,
    /// Start even under automated-test/CI execution.
    pub allow_in_tests: bool,
}

/// Handle to a running (or disabled) canvas host.
///
/// Single owner; [`CanvasHost::close`] tears down watcher, sockets, and
/// listener in that order.
pub struct CanvasHost {
    port: u16,
    root_dir: PathBuf,
    inner: Option<RunningHost>,
}

struct RunningHost {
    state: Arc<AppState>,
    watcher: CanvasWatcher,
    shutdown_tx: oneshot::Sender<()>,
    serve_task: JoinHandle<()>,
}

impl CanvasHost {
    /// Handle for an environment where the host is disabled.
    fn disabled() -> Self {
        Self {
            port: 0,
            root_dir: PathBuf::new(),
            inner: None,
        }
    }

    /// Bound port (nonzero once startup resolves; 0 when disabled).
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Configured canvas root directory (empty when disabled).
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Whether the host was disabled by the test/CI escape hatch.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.inner.is_none()
    }

    /// Shut down: stop the debounce timer and watcher, close all
    /// sockets, then close the listener. Each step is best-effort but
    /// sequenced so no late reload is attempted on a closed transport.
    pub async fn close(mut self) {
        let Some(inner) = self.inner.take() else {
            return;
        };
        inner.watcher.stop();
        inner.state.reload.shutdown();
        let _ = inner.shutdown_tx.send(());
        let _ = inner.serve_task.await;
        tracing::info!("canvas host stopped");
    }
}

/// Start the canvas host.
///
/// Under automated-test/CI execution the host is disabled unless
/// `allow_in_tests` is set; the returned handle then reports port 0 and
/// an empty root.
///
/// # Errors
///
/// Only a failure to prepare the root, bind the listener, or start the
/// watcher aborts startup. Seeding the default index document and
/// locating the UI assets are best-effort.
pub async fn start(opts: CanvasHostOpts) -> Result<CanvasHost, StartError> {
    if canvas_config::skip_requested() && !opts.allow_in_tests {
        tracing::info!("canvas host disabled under test/CI environment");
        return Ok(CanvasHost::disabled());
    }

    let root_dir = opts
        .root_dir
        .as_deref()
        .map_or_else(canvas_config::default_root_dir, |dir| {
            canvas_config::resolve_user_path(dir)
        });
    tokio::fs::create_dir_all(&root_dir).await?;
    let root_real = tokio::fs::canonicalize(&root_dir).await?;

    seed_default_index(&root_real).await;
    let ui_root = resolve_ui_root().await;

    let state = Arc::new(AppState {
        root_real: root_real.clone(),
        root_display: root_dir.clone(),
        ui_root,
        reload: ReloadHub::new(),
    });

    let bind_host = opts
        .host
        .as_deref()
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .unwrap_or("0.0.0.0");
    let addr = SocketAddr::from_str(&format!("{bind_host}:{}", opts.port))
        .map_err(|_| StartError::Addr(format!("{bind_host}:{}", opts.port)))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    let port = listener.local_addr()?.port();

    let watcher = CanvasWatcher::start(&root_real, state.reload.notifier())?;

    let router = app::create_router(Arc::clone(&state));
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let serve_task = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(err) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %err, "canvas host server error");
        }
    });

    tracing::info!(
        host = %bind_host,
        port,
        root = %root_dir.display(),
        "canvas host listening"
    );

    Ok(CanvasHost {
        port,
        root_dir,
        inner: Some(RunningHost {
            state,
            watcher,
            shutdown_tx,
            serve_task,
        }),
    })
}

/// Build startup options from the application configuration.
#[must_use]
pub fn opts_from_config(config: &canvas_config::Config) -> CanvasHostOpts {
    CanvasHostOpts {
        root_dir: Some(config.root_dir.clone()),
        port: config.server.port,
        host: Some(config.server.host.clone()),
        allow_in_tests: config.allow_in_tests,
    }
}

/// Seed a starter index document into an empty root.
///
/// Failure is non-fatal: the server still starts and answers 404 until a
/// document is supplied.
async fn seed_default_index(root_real: &Path) {
    let index_path = root_real.join(resolve::INDEX_FILE);
    if tokio::fs::symlink_metadata(&index_path).await.is_ok() {
        return;
    }
    if let Err(err) = tokio::fs::write(&index_path, inject::default_index_html()).await {
        tracing::warn!(error = %err, path = %index_path.display(), "failed to seed starter page");
    }
}

/// Locate and canonicalize the UI asset root. Absence is non-fatal.
async fn resolve_ui_root() -> Option<PathBuf> {
    let Some(dir) = locate_ui_root(&ui_root_candidates()) else {
        tracing::warn!("UI assets not found; {UI_PREFIX} will answer 503");
        return None;
    };
    match tokio::fs::canonicalize(&dir).await {
        Ok(real) => Some(real),
        Err(err) => {
            tracing::warn!(error = %err, dir = %dir.display(), "failed to canonicalize UI asset root");
            None
        }
    }
}
