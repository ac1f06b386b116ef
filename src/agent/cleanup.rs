//! Delayed, best-effort removal of a run's temp files.

use crate::utils::fs as fsutil;
use std::{path::PathBuf, time::Duration};
use tokio::task::JoinHandle;

/// Handle to a scheduled cleanup.
#[derive(Debug)]
pub struct CleanupHandle(Option<JoinHandle<()>>);

impl CleanupHandle {
    /// Wait until the files have been removed.
    pub async fn wait(mut self) {
        if let Some(handle) = self.0.take() {
            let _ = handle.await;
        }
    }
}

/// Delete `paths` after `grace`. Errors are ignored.
pub fn schedule(paths: Vec<PathBuf>, grace: Duration) -> CleanupHandle {
    if paths.is_empty() {
        return CleanupHandle(None);
    }
    CleanupHandle(Some(tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        for path in paths {
            if let Err(e) = fsutil::remove_file(&path).await {
                log::debug!("cleanup of {} failed: {e}", path.display());
            }
        }
    })))
}
