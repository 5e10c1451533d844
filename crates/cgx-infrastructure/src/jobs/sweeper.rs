//! Background sweeper evicting expired terminal jobs.

use std::sync::Arc;
use std::time::Duration;

use cgx_domain::ports::jobs::JobManager;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Periodic cleanup task for a [`JobManager`].
///
/// Runs on the tokio runtime and is explicitly cancellable, so it never
/// keeps the process alive: `shutdown` stops the loop, and dropping the
/// handle aborts it.
pub struct JobSweeper {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl JobSweeper {
    /// Spawn a sweeper that removes terminal jobs older than `ttl_ms` every
    /// `interval`.
    #[must_use]
    pub fn spawn(manager: Arc<dyn JobManager>, interval: Duration, ttl_ms: i64) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so a fresh manager
            // is not swept before any job ages.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = manager.cleanup_old_jobs(ttl_ms);
                        if removed > 0 {
                            debug!(removed, "Swept expired terminal jobs");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Job sweeper stopped");
        });
        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Stop the sweeper and wait for its task to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for JobSweeper {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}
