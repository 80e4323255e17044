//! WebSocket endpoint for reload delivery.
//!
//! The channel is server→client only: the sole message body is the
//! literal text `"reload"`. Inbound frames are drained and ignored.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{FromRequestParts, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::sync::broadcast;

use super::broadcast::{RELOAD_MESSAGE, ReloadSignal};
use crate::state::AppState;

/// Handle the fixed upgrade path.
///
/// Plain (non-upgrade) requests to this path answer 426; upgrades hand
/// the socket to [`handle_socket`].
pub(crate) async fn ws_handler(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
) -> Response {
    let (mut parts, _body) = req.into_parts();
    match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
        Ok(upgrade) => upgrade
            .on_upgrade(move |socket| handle_socket(socket, state))
            .into_response(),
        Err(_) => (StatusCode::UPGRADE_REQUIRED, "upgrade required").into_response(),
    }
}

/// Forward reload signals to one established connection.
///
/// The subscription is the socket's registry membership: it begins on
/// connect and ends when the socket closes or the hub shuts down.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut receiver = state.reload.subscribe();

    loop {
        tokio::select! {
            result = receiver.recv() => {
                match result {
                    Ok(ReloadSignal::Reload) => {
                        // Best-effort delivery; a dead socket just exits.
                        if socket.send(Message::Text(RELOAD_MESSAGE.into())).await.is_err() {
                            break;
                        }
                    }
                    Ok(ReloadSignal::Shutdown) | Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}
