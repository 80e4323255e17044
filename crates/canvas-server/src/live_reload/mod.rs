//! Live reload: file watching, debounced broadcasting, WebSocket delivery.

mod broadcast;
mod watcher;
mod websocket;

pub(crate) use broadcast::ReloadHub;
pub(crate) use watcher::CanvasWatcher;
pub(crate) use websocket::ws_handler;
