//! Debounced reload broadcasting.
//!
//! A burst of filesystem events collapses into one outbound `"reload"` per
//! quiescent window. The hub owns the single debounce timer; connected
//! sockets are the subscribers of a broadcast channel, so no registry
//! locking is needed.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// The literal text frame pushed to clients.
pub(crate) const RELOAD_MESSAGE: &str = "reload";

/// Idle period after the last qualifying event before a broadcast fires.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(75);

/// Signal fanned out to connected sockets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReloadSignal {
    /// Send the reload frame.
    Reload,
    /// The host is closing; drop the connection.
    Shutdown,
}

/// Clonable handle for reporting filesystem activity to the hub.
#[derive(Clone)]
pub(crate) struct ReloadNotifier(mpsc::UnboundedSender<()>);

impl ReloadNotifier {
    /// Report one qualifying filesystem event. Resets the pending timer.
    pub(crate) fn notify(&self) {
        let _ = self.0.send(());
    }
}

/// Owns the debounce timer and the socket-facing broadcast channel.
pub(crate) struct ReloadHub {
    notify_tx: mpsc::UnboundedSender<()>,
    broadcast_tx: broadcast::Sender<ReloadSignal>,
    debounce_task: JoinHandle<()>,
}

impl ReloadHub {
    pub(crate) fn new() -> Self {
        Self::with_debounce(DEBOUNCE_WINDOW)
    }

    /// Create a hub with a custom debounce window.
    pub(crate) fn with_debounce(window: Duration) -> Self {
        let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<()>();
        let (broadcast_tx, _) = broadcast::channel::<ReloadSignal>(16);

        let tx = broadcast_tx.clone();
        let debounce_task = tokio::spawn(async move {
            while notify_rx.recv().await.is_some() {
                // One pending timer; every further event resets it. Fires
                // once the window passes with no new events.
                loop {
                    match tokio::time::timeout(window, notify_rx.recv()).await {
                        Ok(Some(())) => {}
                        Ok(None) => return,
                        Err(_) => break,
                    }
                }
                // Best-effort: no subscribers is not an error.
                let receivers = tx.send(ReloadSignal::Reload).unwrap_or(0);
                tracing::debug!(receivers, "reload broadcast");
            }
        });

        Self {
            notify_tx,
            broadcast_tx,
            debounce_task,
        }
    }

    /// Handle for the file watcher to report events through.
    pub(crate) fn notifier(&self) -> ReloadNotifier {
        ReloadNotifier(self.notify_tx.clone())
    }

    /// Register interest in reload signals (one subscription per socket).
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ReloadSignal> {
        self.broadcast_tx.subscribe()
    }

    /// Cancel any pending timer and tell every subscriber to disconnect.
    pub(crate) fn shutdown(&self) {
        self.debounce_task.abort();
        let _ = self.broadcast_tx.send(ReloadSignal::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    const WINDOW: Duration = Duration::from_millis(10);

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_into_one_broadcast() {
        let hub = ReloadHub::with_debounce(WINDOW);
        let mut rx = hub.subscribe();

        let notifier = hub.notifier();
        notifier.notify();
        tokio::time::sleep(Duration::from_millis(3)).await;
        notifier.notify();
        tokio::time::sleep(Duration::from_millis(3)).await;
        notifier.notify();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(rx.try_recv(), Ok(ReloadSignal::Reload));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_broadcast_separately() {
        let hub = ReloadHub::with_debounce(WINDOW);
        let mut rx = hub.subscribe();

        hub.notifier().notify();
        tokio::time::sleep(Duration::from_millis(50)).await;
        hub.notifier().notify();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(rx.try_recv(), Ok(ReloadSignal::Reload));
        assert_eq!(rx.try_recv(), Ok(ReloadSignal::Reload));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_subscriber_sees_the_broadcast() {
        let hub = ReloadHub::with_debounce(WINDOW);
        let mut rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();
        let mut rx3 = hub.subscribe();

        hub.notifier().notify();
        tokio::time::sleep(Duration::from_millis(50)).await;

        for rx in [&mut rx1, &mut rx2, &mut rx3] {
            assert_eq!(rx.try_recv(), Ok(ReloadSignal::Reload));
            assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_events_no_broadcast() {
        let hub = ReloadHub::with_debounce(WINDOW);
        let mut rx = hub.subscribe();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_window() {
        let hub = ReloadHub::with_debounce(WINDOW);
        let mut rx = hub.subscribe();

        hub.notifier().notify();
        hub.shutdown();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(rx.try_recv(), Ok(ReloadSignal::Shutdown));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_without_subscribers_is_swallowed() {
        let hub = ReloadHub::with_debounce(WINDOW);

        hub.notifier().notify();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Nothing to assert beyond "did not panic"; a late subscriber
        // starts with an empty queue.
        let mut rx = hub.subscribe();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }
}
