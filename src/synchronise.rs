//! High-level pipeline: fetch → validate → replace → sitemap, per source.
//!
//! The [`Syncer`] walks the configured sources strictly in order, one at a
//! time. A fatal error in one source is logged at this boundary and never
//! stops the remaining sources. After the loop the downstream search index
//! is asked to rebuild once, and the finish notification goes out.
//!
//! Notification delivery is best-effort: subscriber failures are logged
//! and swallowed so an observer can never abort a sync.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::branch::{extract_branch, is_whitelisted};
use crate::config::{Config, Source};
use crate::contract::{
    BoxedError, Downloader, FinishEvent, SearchIndex, SourceEvent, Subscriber,
};
use crate::download::DownloadError;
use crate::replace::{self, ReplaceError, ReplaceOutcome};
use crate::sitemap::{self, SiteMapItem, SitemapError};

/// Fatal failure of one source's pipeline. Later sources still run.
#[derive(Debug)]
pub enum SourceError {
    Download(DownloadError),
    Replace(ReplaceError),
    Sitemap(SitemapError),
}

impl From<DownloadError> for SourceError {
    fn from(e: DownloadError) -> Self {
        SourceError::Download(e)
    }
}

impl From<ReplaceError> for SourceError {
    fn from(e: ReplaceError) -> Self {
        SourceError::Replace(e)
    }
}

impl From<SitemapError> for SourceError {
    fn from(e: SitemapError) -> Self {
        SourceError::Sitemap(e)
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Download(e) => write!(f, "download failed: {e}"),
            SourceError::Replace(e) => write!(f, "tree replacement failed: {e}"),
            SourceError::Sitemap(e) => write!(f, "sitemap rebuild failed: {e}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// What happened to one source.
#[derive(Debug)]
pub enum ProcessOutcome {
    Synced(ReplaceOutcome),
    /// The archive's branch is not whitelisted; nothing was touched.
    Rejected { branch: String },
}

/// Tally of a full run, for callers and the finish notification.
#[derive(Debug, Clone, Copy)]
pub struct SyncReport {
    pub synced: usize,
    pub skipped: usize,
}

/// Sequences the sync pipeline over all configured sources.
pub struct Syncer<I: SearchIndex> {
    config: Config,
    downloader: Box<dyn Downloader>,
    index: I,
    subscribers: Vec<Box<dyn Subscriber>>,
}

impl<I: SearchIndex> Syncer<I> {
    pub fn new(config: Config, downloader: Box<dyn Downloader>, index: I) -> Self {
        Self {
            config,
            downloader,
            index,
            subscribers: Vec::new(),
        }
    }

    /// Registers a notification subscriber for this syncer instance.
    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Runs the whole pipeline over every configured source, in order.
    pub async fn run(&self) -> SyncReport {
        info!(
            root_dir = %self.config.root_dir.display(),
            sources = self.config.sources.len(),
            "Started documentation sync"
        );

        let mut synced = 0;
        let mut skipped = 0;
        for source in &self.config.sources {
            info!(url = %source.url, folder = %source.folder, "Processing source");
            match self.process(source).await {
                Ok(ProcessOutcome::Synced(outcome)) => {
                    synced += 1;
                    let event = SourceEvent {
                        folder: source.folder.clone(),
                    };
                    if outcome.created_target {
                        self.dispatch("create", |s| s.on_create(&event));
                    }
                    if outcome.stale_removed > 0 {
                        self.dispatch("delete", |s| s.on_delete(&event));
                    }
                    self.dispatch("update", |s| s.on_update(&event));
                }
                Ok(ProcessOutcome::Rejected { branch }) => {
                    skipped += 1;
                    warn!(
                        branch = %branch,
                        folder = %source.folder,
                        "Source skipped, branch not whitelisted"
                    );
                }
                Err(e) => {
                    skipped += 1;
                    error!(
                        error = ?e,
                        url = %source.url,
                        folder = %source.folder,
                        "Source failed, continuing with remaining sources"
                    );
                }
            }
        }

        if synced > 0 {
            // Fire-and-forget from the pipeline's point of view: a failed
            // rebuild leaves the previous index serving until the next run.
            if let Err(e) = self.index.rebuild(&self.config.index_name).await {
                error!(error = ?e, index = %self.config.index_name, "Search index rebuild failed");
            } else {
                info!(index = %self.config.index_name, "Search index rebuild signalled");
            }
        }

        let report = SyncReport { synced, skipped };
        let finish = FinishEvent { synced, skipped };
        self.dispatch("finish", |s| s.on_finish(&finish));
        info!(synced = synced, skipped = skipped, "Documentation sync finished");
        report
    }

    /// One source's pipeline: fetch, gate on the branch, replace the tree,
    /// rebuild the sitemap.
    pub async fn process(&self, source: &Source) -> Result<ProcessOutcome, SourceError> {
        let archive_path = self.archive_path(source);
        let target_dir = self.config.root_dir.join(&source.folder);

        self.downloader.fetch(&source.url, &archive_path).await?;

        let top_entry = replace::top_level_entry(&archive_path)?;
        let branch = extract_branch(&top_entry, &self.config.archive_prefix);
        if !is_whitelisted(&branch, &self.config.whitelist()) {
            return Ok(ProcessOutcome::Rejected { branch });
        }

        let outcome = replace::replace(&archive_path, &target_dir).await?;

        let tree = sitemap::build(&target_dir).map_err(SitemapError::from)?;
        sitemap::write(&target_dir, &tree)?;

        Ok(ProcessOutcome::Synced(outcome))
    }

    /// Bootstrap: skip entirely when the root sitemap already exists,
    /// unless forced. Creates the root directory on first run.
    pub async fn ensure_synced(&self, force: bool) -> io::Result<Option<SyncReport>> {
        let marker = self.config.root_dir.join(sitemap::SITEMAP_FILE);
        if !force && marker.exists() {
            info!(marker = %marker.display(), "Sitemap already present, skipping sync");
            return Ok(None);
        }
        if !self.config.root_dir.exists() {
            fs::create_dir_all(&self.config.root_dir)?;
        }
        Ok(Some(self.run().await))
    }

    /// Reads the persisted sitemap for one synced folder.
    pub fn sitemap(&self, folder: &str) -> Result<SiteMapItem, SitemapError> {
        sitemap::read(&self.config.root_dir.join(folder))
    }

    /// The archive lands next to the target folder, named after it
    /// (`<folder>archive.zip`, plain `archive.zip` for the root).
    fn archive_path(&self, source: &Source) -> PathBuf {
        self.config
            .root_dir
            .join(format!("{}archive.zip", source.folder))
    }

    fn dispatch<F>(&self, hook: &str, mut deliver: F)
    where
        F: FnMut(&dyn Subscriber) -> Result<(), BoxedError>,
    {
        for subscriber in &self.subscribers {
            if let Err(e) = deliver(subscriber.as_ref()) {
                error!(error = ?e, hook = hook, "Error in notification subscriber");
            }
        }
    }
}

/// Search index stand-in for standalone CLI runs: only logs the signal.
pub struct LoggingIndex;

#[async_trait::async_trait]
impl SearchIndex for LoggingIndex {
    async fn rebuild(&self, index_name: &str) -> Result<(), BoxedError> {
        info!(index = %index_name, "Index rebuild requested (no indexer attached)");
        Ok(())
    }
}
