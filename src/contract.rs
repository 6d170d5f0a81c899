//! Interfaces between the sync pipeline and its external collaborators.
//!
//! The pipeline itself only knows three seams:
//! - [`Downloader`]: retrieves a remote archive to a local path.
//! - [`SearchIndex`]: the downstream full-text index asked to rebuild after
//!   a sync run.
//! - [`Subscriber`]: notification hooks fired at well-known points of a run.
//!
//! All traits are annotated for `mockall` so tests can generate
//! deterministic mocks (exported behind the `test-export-mocks` feature).

use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::download::DownloadError;

/// Boxed error for trait-object seams; collaborators decide their own
/// failure types.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Retrieves a remote archive into a local file.
///
/// Implementors must create missing ancestor directories of `dest` and
/// replace any existing file there, so the destination always holds exactly
/// one fresh file afterwards.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// The downstream search index rebuilt after a completed sync run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn rebuild(&self, index_name: &str) -> Result<(), BoxedError>;
}

/// Payload for the per-source notifications.
#[derive(Debug, Clone)]
pub struct SourceEvent {
    /// Folder of the source, relative to the sync root.
    pub folder: String,
}

/// Payload for the end-of-run notification.
#[derive(Debug, Clone)]
pub struct FinishEvent {
    /// Number of sources that completed the full pipeline.
    pub synced: usize,
    /// Number of sources skipped or failed.
    pub skipped: usize,
}

/// Notification hooks for external observers of a sync run.
///
/// Delivery is synchronous and best-effort: a returned error is logged by
/// the dispatcher and never aborts the run. All methods default to no-ops
/// so implementors subscribe only to the points they care about.
pub trait Subscriber: Send + Sync {
    /// A source's local tree was replaced with fresh content.
    fn on_update(&self, _event: &SourceEvent) -> Result<(), BoxedError> {
        Ok(())
    }

    /// A source's target folder was created for the first time.
    fn on_create(&self, _event: &SourceEvent) -> Result<(), BoxedError> {
        Ok(())
    }

    /// Stale content was deleted from a source's target folder.
    fn on_delete(&self, _event: &SourceEvent) -> Result<(), BoxedError> {
        Ok(())
    }

    /// The whole run completed, successfully or not per source.
    fn on_finish(&self, _event: &FinishEvent) -> Result<(), BoxedError> {
        Ok(())
    }
}
