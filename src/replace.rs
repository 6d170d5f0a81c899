//! Tree replacement: extract the archive, drop stale content, promote the
//! fresh tree into place.
//!
//! The ordering is what keeps the tree consistent under a crash: stale
//! siblings are only removed after a full extraction, and promotion happens
//! before the extraction root is deleted. At any point the target holds the
//! old tree, the new tree, or the new tree still under its extraction root
//! (which the next run removes in step one) — never a mix of old and new
//! top-level entries.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::retry::{retry, DEFAULT_ATTEMPTS, DEFAULT_DELAY};

#[derive(Debug)]
pub enum ReplaceError {
    /// The archive is corrupt or unreadable.
    Extraction(ZipError),
    /// The archive holds no entries at all, so there is no branch to sync.
    EmptyArchive,
    /// A filesystem operation failed: a delete after exhausting the
    /// bounded retries, or a promotion move (not retried; only deletes
    /// contend with lingering file handles).
    Filesystem(std::io::Error),
}

impl From<ZipError> for ReplaceError {
    fn from(e: ZipError) -> Self {
        ReplaceError::Extraction(e)
    }
}

impl From<std::io::Error> for ReplaceError {
    fn from(e: std::io::Error) -> Self {
        ReplaceError::Filesystem(e)
    }
}

impl std::fmt::Display for ReplaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplaceError::Extraction(e) => write!(f, "archive extraction failed: {e}"),
            ReplaceError::EmptyArchive => write!(f, "archive contains no entries"),
            ReplaceError::Filesystem(e) => write!(f, "filesystem operation failed: {e}"),
        }
    }
}

impl std::error::Error for ReplaceError {}

/// What `replace` did to the target folder, for the notification hooks.
#[derive(Debug, Clone, Copy)]
pub struct ReplaceOutcome {
    /// The target folder did not exist before this run.
    pub created_target: bool,
    /// Stale directories and loose markdown files removed.
    pub stale_removed: usize,
}

/// Name of the first entry in the archive, which carries the branch for a
/// zipball (`<repo>-<branch>/`). Read without extracting anything.
pub fn top_level_entry(archive_path: &Path) -> Result<String, ReplaceError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    if archive.is_empty() {
        return Err(ReplaceError::EmptyArchive);
    }
    let entry = archive.by_index(0)?;
    Ok(entry.name().to_string())
}

fn extraction_root_of(target_dir: &Path, top_entry: &str) -> Result<PathBuf, ReplaceError> {
    let name = top_entry
        .split('/')
        .find(|segment| !segment.is_empty())
        .ok_or(ReplaceError::EmptyArchive)?;
    Ok(target_dir.join(name))
}

/// Replaces the content of `target_dir` with the tree inside the archive.
///
/// All entries in the archive live under one top-level directory (the
/// extraction root); its children are promoted one level up and the empty
/// root is deleted. Deletes go through bounded retry to ride out transient
/// file locks.
pub async fn replace(
    archive_path: &Path,
    target_dir: &Path,
) -> Result<ReplaceOutcome, ReplaceError> {
    let created_target = !target_dir.exists();
    if created_target {
        fs::create_dir_all(target_dir)?;
    }

    let top_entry = top_level_entry(archive_path)?;
    let extraction_root = extraction_root_of(target_dir, &top_entry)?;

    // A leftover extraction root from a crashed run would make extraction
    // trip over existing files.
    if extraction_root.exists() {
        warn!(
            path = %extraction_root.display(),
            "Removing leftover extraction root from a previous run"
        );
        remove_dir_retried(&extraction_root).await?;
    }

    info!(
        archive = %archive_path.display(),
        target = %target_dir.display(),
        "Extracting archive"
    );
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    archive.extract(target_dir)?;

    let stale_removed = remove_stale(target_dir, &extraction_root).await?;

    // Promote the fresh tree one level up, then drop the empty root.
    for child in fs::read_dir(&extraction_root)? {
        let child = child?;
        let dest = target_dir.join(child.file_name());
        debug!(from = %child.path().display(), to = %dest.display(), "Promoting entry");
        fs::rename(child.path(), &dest)?;
    }
    remove_dir_retried(&extraction_root).await?;

    info!(
        target = %target_dir.display(),
        stale_removed = stale_removed,
        "Tree replaced"
    );
    Ok(ReplaceOutcome {
        created_target,
        stale_removed,
    })
}

/// Removes every directory directly under `target_dir` except the
/// extraction root, and every loose markdown file directly under it. These
/// are leftovers of a previous sync or of a removed documentation source.
async fn remove_stale(target_dir: &Path, extraction_root: &Path) -> Result<usize, ReplaceError> {
    let mut removed = 0;
    for entry in fs::read_dir(target_dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if path == extraction_root {
                continue;
            }
            debug!(path = %path.display(), "Removing stale directory");
            remove_dir_retried(&path).await?;
            removed += 1;
        } else if path.extension().is_some_and(|ext| ext == "md") {
            debug!(path = %path.display(), "Removing stale markdown file");
            let target = path.clone();
            retry(DEFAULT_ATTEMPTS, DEFAULT_DELAY, move || {
                fs::remove_file(&target)
            })
            .await?;
            removed += 1;
        }
    }
    Ok(removed)
}

async fn remove_dir_retried(path: &Path) -> Result<(), ReplaceError> {
    let target = path.to_path_buf();
    retry(DEFAULT_ATTEMPTS, DEFAULT_DELAY, move || {
        fs::remove_dir_all(&target)
    })
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zipball(path: &Path, top_dir: &str, files: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        writer.add_directory(format!("{top_dir}/"), options).unwrap();
        for (name, content) in files {
            writer
                .start_file(format!("{top_dir}/{name}"), options)
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn reads_top_level_entry() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.zip");
        write_zipball(&archive, "UmbracoDocs-main", &[("index.md", "hi")]);
        assert_eq!(top_level_entry(&archive).unwrap(), "UmbracoDocs-main/");
    }

    #[test]
    fn empty_archive_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("empty.zip");
        let writer = zip::ZipWriter::new(File::create(&archive).unwrap());
        writer.finish().unwrap();
        assert!(matches!(
            top_level_entry(&archive),
            Err(ReplaceError::EmptyArchive)
        ));
    }

    #[test]
    fn corrupt_archive_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();
        assert!(matches!(
            top_level_entry(&archive),
            Err(ReplaceError::Extraction(_))
        ));
    }

    #[tokio::test]
    async fn promotes_contents_and_drops_extraction_root() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.zip");
        write_zipball(
            &archive,
            "UmbracoDocs-main",
            &[("x.md", "# X"), ("guide/intro.md", "# Intro")],
        );
        let target = dir.path().join("docs");

        let outcome = replace(&archive, &target).await.unwrap();
        assert!(outcome.created_target);
        assert!(target.join("x.md").is_file());
        assert!(target.join("guide").join("intro.md").is_file());
        assert!(!target.join("UmbracoDocs-main").exists());
    }

    #[tokio::test]
    async fn stale_siblings_and_loose_markdown_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("docs");
        fs::create_dir_all(target.join("A")).unwrap();
        fs::create_dir_all(target.join("B")).unwrap();
        fs::write(target.join("A").join("old.md"), "old").unwrap();
        fs::write(target.join("stale.md"), "stale").unwrap();
        // Loose non-markdown files survive a replace.
        fs::write(target.join("notes.txt"), "keep").unwrap();

        let archive = dir.path().join("archive.zip");
        write_zipball(&archive, "C", &[("x.md", "fresh")]);

        let outcome = replace(&archive, &target).await.unwrap();
        assert!(!outcome.created_target);
        assert_eq!(outcome.stale_removed, 3);
        assert!(!target.join("A").exists());
        assert!(!target.join("B").exists());
        assert!(!target.join("stale.md").exists());
        assert!(target.join("notes.txt").is_file());
        assert_eq!(fs::read_to_string(target.join("x.md")).unwrap(), "fresh");
        assert!(!target.join("C").exists());
    }

    #[tokio::test]
    async fn leftover_extraction_root_is_cleaned_first() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("docs");
        fs::create_dir_all(target.join("C").join("deep")).unwrap();
        fs::write(target.join("C").join("orphan.md"), "orphan").unwrap();

        let archive = dir.path().join("archive.zip");
        write_zipball(&archive, "C", &[("x.md", "fresh")]);

        replace(&archive, &target).await.unwrap();
        assert!(!target.join("C").exists());
        assert!(!target.join("deep").exists());
        assert!(!target.join("orphan.md").exists());
        assert!(target.join("x.md").is_file());
    }
}
