//! Background task management for the acquisition pipeline
//!
//! Two tasks run for the lifetime of a long-lived orchestrator: the session
//! refresh loop and the periodic sweep of expired cache entries. Both stop on
//! the shared shutdown broadcast.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::cache::CacheLayers;
use crate::app::session::SessionCoordinator;
use crate::constants::coordinator;

/// Owns the spawned background tasks
#[derive(Debug, Default)]
pub struct BackgroundTaskManager {
    tasks: Vec<JoinHandle<()>>,
}

impl BackgroundTaskManager {
    /// Create a new background task manager
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Start the periodic forced re-login
    pub fn start_session_refresh_task(
        &mut self,
        session: &SessionCoordinator,
        shutdown_rx: broadcast::Receiver<()>,
    ) {
        self.tasks.push(session.spawn_refresh_loop(shutdown_rx));
    }

    /// Start the periodic sweep of expired cache entries and idle key locks
    pub fn start_cache_purge_task(
        &mut self,
        cache: Arc<CacheLayers>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let task = tokio::spawn(async move {
            let mut purge_interval = tokio::time::interval(cache.config().purge_interval);
            purge_interval.tick().await;

            loop {
                tokio::select! {
                    _ = purge_interval.tick() => {
                        let purged = cache.purge_expired().await;
                        if purged > 0 {
                            info!("Purged {} expired cache entries", purged);
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Cache purge task received shutdown signal");
                        break;
                    }
                }
            }
        });

        self.tasks.push(task);
    }

    /// Shutdown all background tasks with timeout
    ///
    /// The shutdown signal must already have been broadcast.
    pub async fn shutdown_all(self) {
        debug!("Initiating background task shutdown");

        for task in self.tasks {
            if tokio::time::timeout(coordinator::TASK_SHUTDOWN_TIMEOUT, task)
                .await
                .is_err()
            {
                warn!(
                    "Background task shutdown timed out after {:?}",
                    coordinator::TASK_SHUTDOWN_TIMEOUT
                );
            }
        }

        debug!("All background tasks shutdown complete");
    }

    /// Get the number of active background tasks
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}
