//! Background loops owned by the coordination components
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub mod presence;

pub use presence::PresenceTracker;

/// Handle to a spawned loop. Dropping it signals shutdown and aborts the task,
/// so an owner stops its timer simply by letting go of the handle.
pub struct BackgroundTask {
    shutdown_tx: watch::Sender<()>,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    /// Spawn `body` with a shutdown receiver it is expected to `select!` on
    pub fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(watch::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let handle = tokio::spawn(body(shutdown_rx));
        Self {
            shutdown_tx,
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        self.handle.abort();
    }
}
