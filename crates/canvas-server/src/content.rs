//! File-serving handlers.
//!
//! Classifies each request (asset subtree / canvas root), delegates to the
//! sandboxed resolver, and streams the file with the HTML injection
//! applied. Unexpected failures are caught here, logged, and answered 500.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;
use crate::{assets, inject, resolve};

/// HTML content type sent for injected documents.
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Serve `GET <UI_PREFIX>` (the asset index document).
pub(crate) async fn serve_ui_index(State(state): State<Arc<AppState>>) -> Response {
    serve_ui(&state, "/").await
}

/// Serve `GET <UI_PREFIX>/{*path}`.
pub(crate) async fn serve_ui_asset(
    axum::extract::Path(path): axum::extract::Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    serve_ui(&state, &format!("/{path}")).await
}

/// Serve a path from the UI asset root, or 503 for the whole subtree
/// when no asset root was found at startup.
async fn serve_ui(state: &AppState, url_path: &str) -> Response {
    let Some(ui_root) = state.ui_root.as_deref() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "UI assets not found").into_response();
    };
    match serve_from_root(ui_root, url_path).await {
        Ok(Some(response)) => response,
        Ok(None) => not_found(),
        Err(err) => internal_error(&err, url_path),
    }
}

/// Fallback handler: everything outside the reserved prefixes is served
/// from the canvas root.
pub(crate) async fn serve_canvas(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
) -> Response {
    if req.method() != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let url_path = req.uri().path().to_owned();

    match serve_from_root(&state.root_real, &url_path).await {
        Ok(Some(response)) => response,
        Ok(None) => missing_canvas_response(&state, &url_path),
        Err(err) => internal_error(&err, &url_path),
    }
}

/// Resolve and read one file. `Ok(None)` means "not found" (rejected or
/// absent path, indistinguishable by design).
async fn serve_from_root(root_real: &Path, url_path: &str) -> std::io::Result<Option<Response>> {
    let Some(file_path) = resolve::resolve_file_path(root_real, url_path).await else {
        return Ok(None);
    };

    // Injected content must always be treated as HTML, whatever the
    // generic detector would guess.
    if has_html_extension(&file_path) {
        let bytes = tokio::fs::read(&file_path).await?;
        // User content is not guaranteed to be UTF-8; decode lossily
        // rather than failing the request.
        let html = String::from_utf8_lossy(&bytes);
        let body = inject::inject_live_reload(&html);
        return Ok(Some(
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, HTML_CONTENT_TYPE.to_owned())],
                body,
            )
                .into_response(),
        ));
    }

    let bytes = tokio::fs::read(&file_path).await?;
    Ok(Some(
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, assets::mime_for(&file_path))],
            bytes,
        )
            .into_response(),
    ))
}

/// Whether the resolved filename ends in an HTML extension.
fn has_html_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

/// 404 for the canvas subtree.
///
/// Directory requests name the missing index document and the configured
/// root; that is the only case more specific than "not found", since it
/// does not leak structure of attacker-supplied paths.
fn missing_canvas_response(state: &AppState, url_path: &str) -> Response {
    if url_path == "/" || url_path.ends_with('/') {
        let body = format!(
            "<!doctype html><meta charset=\"utf-8\" /><title>Canvas</title>\
             <pre>Missing file.\nCreate {}/{}</pre>",
            state.root_display.display(),
            resolve::INDEX_FILE,
        );
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, HTML_CONTENT_TYPE.to_owned())],
            body,
        )
            .into_response();
    }
    not_found()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

fn internal_error(err: &std::io::Error, url_path: &str) -> Response {
    tracing::error!(error = %err, path = %url_path, "canvas request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "error").into_response()
}
