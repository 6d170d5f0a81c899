//! Navigation sitemap: an ordered tree mirroring the on-disk structure of a
//! synced documentation folder.
//!
//! Ordering is data-driven: a static `(level, name) -> rank` table assigns
//! well-known sections their place, everything else gets [`DEFAULT_RANK`]
//! and sorts after the ranked siblings. Ties keep filesystem enumeration
//! order (the sort is stable). The tree is rebuilt in full on every sync
//! and serialized as pretty-printed JSON to `sitemap.js` at the folder
//! root, which doubles as the "already synced" marker for the bootstrap
//! check.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// File name of the persisted sitemap within a synced folder.
pub const SITEMAP_FILE: &str = "sitemap.js";

/// Rank for directory names absent from the table; orders them after every
/// explicitly ranked sibling.
pub const DEFAULT_RANK: i32 = 100;

const URL_TEMPLATE_HOST: &str = "https://our.umbraco.org";

/// Per-level section ranks. Lookup is by `(level, lowercased name)`; first
/// match wins. Level 0 (the synced folder itself) is never ranked.
static SECTION_RANKS: &[(u32, &str, i32)] = &[
    // Level 1: top-level sections.
    (1, "getting-started", 0),
    (1, "implementation", 1),
    (1, "extending", 2),
    (1, "reference", 3),
    (1, "tutorials", 4),
    (1, "add-ons", 5),
    (1, "umbraco-cloud", 6),
    // Level 2: Getting Started.
    (2, "setup", 0),
    (2, "backoffice", 1),
    (2, "data", 2),
    (2, "design", 3),
    (2, "code", 4),
    // Level 2: Implementation.
    (2, "default-routing", 0),
    (2, "custom-routing", 1),
    (2, "controllers", 2),
    (2, "data-persistence", 3),
    (2, "rest-api", 4),
    // Level 2: Extending.
    (2, "dashboards", 0),
    (2, "section-trees", 1),
    (2, "property-editors", 2),
    (2, "macro-parameter-editors", 3),
    (2, "healthcheck", 4),
    (2, "language-files", 5),
    // Level 2: Reference.
    (2, "config", 0),
    (2, "templating", 1),
    (2, "querying", 2),
    (2, "routing", 3),
    (2, "searching", 4),
    (2, "events", 5),
    (2, "management", 6),
    (2, "plugins", 7),
    (2, "cache", 8),
    (2, "packaging", 9),
    (2, "security", 10),
    (2, "common-pitfalls", 11),
    // Level 2: Tutorials.
    (2, "creating-basic-site", 0),
    (2, "creating-a-custom-dashboard", 1),
    (2, "creating-a-property-editor", 2),
    (2, "multilanguage-setup", 3),
    (2, "starter-kit", 4),
    // Level 2: Add-ons.
    (2, "umbracoforms", 0),
    (2, "umbracocourier", 1),
    // Level 2: Umbraco Cloud.
    (2, "getting-started", 0),
    (2, "set-up", 1),
    (2, "deployment", 2),
    (2, "databases", 3),
    (2, "upgrades", 4),
    (2, "troubleshooting", 5),
    (2, "frequently-asked-questions", 6),
    // Level 3: Getting Started / Setup.
    (3, "requirements", 0),
    (3, "install", 1),
    (3, "upgrading", 2),
    (3, "server-setup", 3),
    // Level 3: Getting Started / Backoffice.
    (3, "sections", 0),
    (3, "property-editors", 1),
    (3, "login", 2),
    // Level 3: Getting Started / Data.
    (3, "defining-content", 0),
    (3, "creating-media", 1),
    (3, "members", 2),
    (3, "data-types", 3),
    (3, "scheduled-publishing", 4),
    // Level 3: Getting Started / Design.
    (3, "templates", 0),
    (3, "rendering-content", 1),
    (3, "rendering-media", 2),
    (3, "stylesheets-javascript", 3),
    // Level 3: Getting Started / Code.
    (3, "umbraco-services", 0),
    (3, "subscribing-to-events", 1),
    (3, "creating-forms", 2),
    // Level 3: Implementation / Default Routing.
    (3, "inbound-pipeline", 0),
    (3, "controller-selection", 1),
    (3, "execute-request", 2),
    // Level 3: Reference / Config.
    (3, "webconfig", 0),
    (3, "404handlers", 1),
    (3, "applications", 2),
    (3, "embeddedmedia", 3),
    (3, "examineindex", 4),
    (3, "examinesettings", 5),
    (3, "filesystemproviders", 6),
    (3, "baserestextensions", 7),
    (3, "tinymceconfig", 8),
    (3, "trees", 9),
    (3, "umbracosettings", 10),
    (3, "dashboard", 11),
    (3, "healthchecks", 12),
    // Level 3: Reference / Templating.
    (3, "mvc", 0),
    (3, "masterpages", 1),
    (3, "macros", 2),
    (3, "modelsbuilder", 3),
    // Level 3: Reference / Querying.
    (3, "ipublishedcontent", 0),
    (3, "dynamicpublishedcontent", 1),
    (3, "umbracohelper", 2),
    (3, "membershiphelper", 3),
    // Level 3: Reference / Routing.
    (3, "authorized", 0),
    (3, "request-pipeline", 1),
    (3, "webapi", 2),
    (3, "iisrewriterules", 3),
    (3, "url-tracking", 4),
    // Level 3: Add-ons / UmbracoForms.
    (3, "installation", 0),
    (3, "editor", 1),
    (3, "developer", 2),
    // Level 3: Add-ons / UmbracoCourier.
    (3, "architechture", 1),
    // Level 3: Umbraco Cloud / Getting Started.
    (3, "project-overview", 0),
    (3, "environments", 1),
    (3, "the-umbraco-cloud-portal", 2),
    (3, "baselines", 3),
    (3, "migrate-existing-site", 4),
    // Level 3: Umbraco Cloud / Set Up.
    (3, "working-locally", 0),
    (3, "visual-studio", 1),
    (3, "working-with-visual-studio", 2),
    (3, "working-with-uaas-cli", 3),
    (3, "project-settings", 4),
    (3, "team-members", 5),
    (3, "media", 6),
    (3, "smtp-settings", 7),
    (3, "manage-domains", 8),
    (3, "config-transforms", 9),
    (3, "power-tools", 10),
    // Level 3: Umbraco Cloud / Deployment.
    (3, "local-to-cloud", 0),
    (3, "cloud-to-cloud", 1),
    (3, "content-transfer", 2),
    (3, "restoring-content", 3),
    (3, "deployment-webhook", 4),
    // Level 3: Umbraco Cloud / Troubleshooting.
    (3, "content-deploy-schema", 0),
    (3, "content-deploy-error", 1),
    (3, "structure-error", 2),
    (3, "duplicate-dictionary-items", 3),
    (3, "moving-from-courier-to-deploy", 4),
    (3, "minor-upgrades", 5),
    (3, "plugins-known-issues", 6),
];

/// Explicit rank for a directory at a depth, if the table names it.
pub fn sort_rank(level: u32, name: &str) -> Option<i32> {
    let lowered = name.to_lowercase();
    SECTION_RANKS
        .iter()
        .find(|(l, n, _)| *l == level && *n == lowered)
        .map(|(_, _, rank)| *rank)
}

#[derive(Debug)]
pub enum SitemapError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl From<std::io::Error> for SitemapError {
    fn from(e: std::io::Error) -> Self {
        SitemapError::Io(e)
    }
}

impl From<serde_json::Error> for SitemapError {
    fn from(e: serde_json::Error) -> Self {
        SitemapError::Serialize(e)
    }
}

impl std::fmt::Display for SitemapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SitemapError::Io(e) => write!(f, "sitemap file i/o failed: {e}"),
            SitemapError::Serialize(e) => write!(f, "sitemap serialization failed: {e}"),
        }
    }
}

impl std::error::Error for SitemapError {}

/// One node of the navigation tree. Field names follow the persisted JSON
/// shape consumed downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMapItem {
    pub name: String,
    pub path: String,
    pub level: u32,
    pub sort: i32,
    #[serde(rename = "hasChildren")]
    pub has_children: bool,
    pub directories: Vec<SiteMapItem>,
    #[serde(default)]
    pub url: String,
}

/// Walks the folder and builds the ordered navigation tree. Pure function
/// of the directory structure; persisting is a separate step.
pub fn build(folder: &Path) -> io::Result<SiteMapItem> {
    walk(folder, folder, 0)
}

fn walk(dir: &Path, root: &Path, level: u32) -> io::Result<SiteMapItem> {
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            subdirs.push(entry.path());
        }
    }

    // Computed before the images filter: a directory holding only an
    // `images` subdirectory still reports children. Downstream templates
    // rely on this, so it is preserved rather than corrected.
    let has_children = !subdirs.is_empty();

    let mut directories = Vec::new();
    for sub in &subdirs {
        let excluded = sub
            .file_name()
            .is_some_and(|n| n == "images");
        if excluded {
            debug!(path = %sub.display(), "Excluding images directory from sitemap");
            continue;
        }
        directories.push(walk(sub, root, level + 1)?);
    }
    // Stable: equal ranks keep enumeration order.
    directories.sort_by_key(|item| item.sort);

    let raw_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path = relative_path(dir, root);

    Ok(SiteMapItem {
        name: raw_name.replace('-', " "),
        url: format!("{URL_TEMPLATE_HOST}/documentation{path}/?altTemplate=Lesson"),
        path,
        level,
        sort: sort_rank(level, &raw_name).unwrap_or(DEFAULT_RANK),
        has_children,
        directories,
    })
}

/// Root-relative location with forward slashes; empty for the root itself,
/// `/a/b` below it.
fn relative_path(dir: &Path, root: &Path) -> String {
    let rel = dir.strip_prefix(root).unwrap_or(dir);
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        String::new()
    } else {
        format!("/{joined}")
    }
}

/// Serializes the tree to `sitemap.js` at the folder root.
pub fn write(folder: &Path, item: &SiteMapItem) -> Result<(), SitemapError> {
    let serialized = serde_json::to_string_pretty(item)?;
    let path = folder.join(SITEMAP_FILE);
    fs::write(&path, serialized)?;
    info!(path = %path.display(), "Sitemap written");
    Ok(())
}

/// Reads the persisted sitemap back from a synced folder.
pub fn read(folder: &Path) -> Result<SiteMapItem, SitemapError> {
    let path = folder.join(SITEMAP_FILE);
    let json = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&json)?)
}
