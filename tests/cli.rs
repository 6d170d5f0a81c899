use std::fs::write;

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn help_lists_the_subcommands() {
    let mut cmd = Command::cargo_bin("docs-pull").expect("binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sync").and(predicate::str::contains("ensure")));
}

#[test]
#[serial]
fn sync_fails_for_missing_config_file() {
    let mut cmd = Command::cargo_bin("docs-pull").expect("binary exists");
    cmd.arg("sync").arg("--config").arg("/no/such/config.yaml");
    cmd.assert().failure();
}

#[test]
#[serial]
fn sync_with_no_sources_reports_an_empty_run() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("docs");
    let config_path = dir.path().join("config.yaml");
    write(
        &config_path,
        format!(
            "root_dir: {}\nallowed_branches: \"main\"\nsources: []\n",
            root.display()
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("docs-pull").expect("binary exists");
    cmd.arg("sync").arg("--config").arg(&config_path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0 synced"));
}

#[test]
#[serial]
fn ensure_skips_when_a_sitemap_marker_exists() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("docs");
    std::fs::create_dir_all(&root).unwrap();
    write(root.join("sitemap.js"), "{}").unwrap();

    let config_path = dir.path().join("config.yaml");
    write(
        &config_path,
        format!(
            "root_dir: {}\nallowed_branches: \"main\"\nsources: []\n",
            root.display()
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("docs-pull").expect("binary exists");
    cmd.arg("ensure").arg("--config").arg(&config_path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("already synced"));
}
