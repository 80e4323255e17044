//! Router construction.
//!
//! Builds the axum router: the fixed WebSocket path, the UI asset
//! subtree, and a fallback serving the canvas root. All responses carry
//! `Cache-Control: no-store` so live reload always observes fresh content.

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::content;
use crate::live_reload;
use crate::state::AppState;
use crate::{UI_PREFIX, WS_PATH};

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(WS_PATH, get(live_reload::ws_handler))
        .route(UI_PREFIX, get(content::serve_ui_index))
        .route(
            &format!("{UI_PREFIX}/{{*path}}"),
            get(content::serve_ui_asset),
        )
        .fallback(content::serve_canvas)
        .layer(ServiceBuilder::new().layer(no_store_layer()))
        .with_state(state)
}

/// Layer that disables caching on every response.
fn no_store_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))
}
