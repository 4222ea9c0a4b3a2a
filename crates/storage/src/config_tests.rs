// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_core::test_support::sample_project;
use tempfile::tempdir;

#[test]
fn open_missing_file_yields_empty_config() {
    let dir = tempdir().unwrap();
    let store = ConfigStore::open(&dir.path().join("config.json")).unwrap();
    assert!(store.projects().is_empty());
    assert_eq!(store.owner_id(), "");
}

#[test]
fn upsert_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    {
        let mut store = ConfigStore::open(&path).unwrap();
        store.set_owner_id("owner-1").unwrap();
        store
            .upsert_project(sample_project("web", "/srv/web"))
            .unwrap();
    }

    let store = ConfigStore::open(&path).unwrap();
    assert_eq!(store.owner_id(), "owner-1");
    let project = store.project("web").unwrap();
    assert_eq!(project.path, PathBuf::from("/srv/web"));
    assert!(!dir.path().join("config.json.tmp").exists());
}

#[test]
fn open_fails_on_unknown_version() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"version":99,"owner_id":"","projects":{}}"#).unwrap();

    assert!(matches!(
        ConfigStore::open(&path).unwrap_err(),
        ConfigError::Version(99)
    ));
}
