//! Branch extraction and whitelist gate.
//!
//! The archive's top-level entry encodes the branch (`<repo>-<branch>/`).
//! An unreviewed branch must never overwrite the live tree, so an empty or
//! missing whitelist rejects everything.

use std::collections::HashSet;

use tracing::{debug, warn};

/// Recovers the branch name from the archive's top-level entry name by
/// dropping path separators and the leading repository prefix.
pub fn extract_branch(top_level_entry: &str, prefix: &str) -> String {
    let flat = top_level_entry.replace('/', "");
    match flat.strip_prefix(prefix) {
        Some(rest) => rest.to_string(),
        None => flat,
    }
}

/// Case-insensitive exact match against the configured whitelist.
///
/// Fails closed: no whitelist entries means no branch is allowed. The
/// caller is expected to warn once per rejected source; an empty
/// whitelist is warned about here since it is a configuration problem.
pub fn is_whitelisted(branch: &str, whitelist: &HashSet<String>) -> bool {
    if whitelist.is_empty() {
        warn!(branch = %branch, "Branch whitelist is empty, rejecting all branches");
        return false;
    }

    let allowed = whitelist.contains(&branch.to_lowercase());
    if !allowed {
        // The orchestrator warns once per rejected source, with the folder.
        debug!(branch = %branch, "Branch is not in the whitelist");
    }
    allowed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist(entries: &[&str]) -> HashSet<String> {
        entries.iter().map(|s| s.to_lowercase()).collect()
    }

    #[test]
    fn extracts_branch_from_zipball_entry() {
        assert_eq!(extract_branch("UmbracoDocs-main/", "UmbracoDocs-"), "main");
        assert_eq!(
            extract_branch("UmbracoDocs-vNext/", "UmbracoDocs-"),
            "vNext"
        );
    }

    #[test]
    fn unknown_prefix_leaves_name_intact() {
        assert_eq!(extract_branch("OtherRepo-main/", "UmbracoDocs-"), "OtherRepo-main");
    }

    #[test]
    fn match_is_case_insensitive() {
        let set = whitelist(&["main", "vNext"]);
        assert!(is_whitelisted("Main", &set));
        assert!(is_whitelisted("VNEXT", &set));
        assert!(!is_whitelisted("experimental", &set));
    }

    #[test]
    fn empty_whitelist_rejects_everything() {
        assert!(!is_whitelisted("main", &HashSet::new()));
    }
}
