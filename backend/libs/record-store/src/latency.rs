/// Artificial latency applied by mock backends
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyConfig {
    pub read: Duration,
    pub write: Duration,
}

impl LatencyConfig {
    pub fn new(read: Duration, write: Duration) -> Self {
        Self { read, write }
    }

    /// No delay at all; useful for unit tests that don't care about interleaving.
    pub fn none() -> Self {
        Self {
            read: Duration::ZERO,
            write: Duration::ZERO,
        }
    }

    pub(crate) async fn before_read(&self) {
        if !self.read.is_zero() {
            tokio::time::sleep(self.read).await;
        }
    }

    pub(crate) async fn before_write(&self) {
        if !self.write.is_zero() {
            tokio::time::sleep(self.write).await;
        }
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            read: Duration::from_millis(200),
            write: Duration::from_millis(300),
        }
    }
}
