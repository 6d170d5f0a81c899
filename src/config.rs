use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default prefix on the archive's top-level entry, stripped to recover the
/// branch name (GitHub zipballs unpack to `<repo>-<branch>/`).
pub const DEFAULT_ARCHIVE_PREFIX: &str = "UmbracoDocs-";

/// Name of the downstream search index asked to rebuild after a sync.
pub const DEFAULT_INDEX_NAME: &str = "documentationIndexer";

fn default_archive_prefix() -> String {
    DEFAULT_ARCHIVE_PREFIX.to_string()
}

fn default_index_name() -> String {
    DEFAULT_INDEX_NAME.to_string()
}

/// Top-level sync configuration: where the documentation tree lives, which
/// branches may overwrite it, and the sources to pull.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub root_dir: PathBuf,
    /// Comma-separated branch names allowed to overwrite local content.
    /// Empty means no branch is allowed (fail closed).
    #[serde(default)]
    pub allowed_branches: String,
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            root_dir = %self.root_dir.display(),
            sources_count = self.sources.len(),
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }

    /// The whitelist as a lowercased set, whitespace trimmed per entry.
    pub fn whitelist(&self) -> HashSet<String> {
        self.allowed_branches
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// One remote archive synced into one subfolder of the root. An empty
/// folder syncs directly into the root itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub folder: String,
}

impl Source {
    pub fn trace_loaded(&self) {
        info!(url = %self.url, folder = %self.folder, "Loaded source");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(allowed: &str) -> Config {
        Config {
            root_dir: PathBuf::from("/tmp/docs"),
            allowed_branches: allowed.to_string(),
            archive_prefix: default_archive_prefix(),
            index_name: default_index_name(),
            sources: vec![],
        }
    }

    #[test]
    fn whitelist_splits_and_lowercases() {
        let config = config_with("Main, vNext ,v9");
        let set = config.whitelist();
        assert!(set.contains("main"));
        assert!(set.contains("vnext"));
        assert!(set.contains("v9"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn empty_whitelist_yields_empty_set() {
        assert!(config_with("").whitelist().is_empty());
        assert!(config_with("  , ,").whitelist().is_empty());
    }
}
