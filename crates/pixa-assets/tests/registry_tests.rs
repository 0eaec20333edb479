//! Registry behaviour over imported packages on disk.

use std::fs;
use std::path::{Path, PathBuf};

use pixa_assets::prelude::*;

fn registry_in(root: &Path) -> AssetRegistry {
    AssetRegistry::new(AssetConfig::with_root(root))
}

fn write_clip(path: &Path, sheet: AssetUuid, durations: &[f32]) {
    let mut clip = AnimationClip::new(sheet, WrapMode::Loop);
    for (i, d) in durations.iter().enumerate() {
        clip.add_frame_with_duration(i, *d);
    }
    fs::write(path, clip.to_json().unwrap()).unwrap();
}

#[test]
fn load_from_path_imports_indexes_and_caches() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("walk.anim");
    write_clip(&source, AssetUuid::from_raw(3), &[0.1, 0.2]);

    let mut registry = registry_in(dir.path());
    let asset = registry.load_asset_from_path(&source).unwrap();
    assert_eq!(asset.asset_type(), AssetType::AnimationClip);

    let uuid = registry.uuid_from_path(&source);
    assert_eq!(uuid, asset.uuid());
    assert_eq!(
        registry.path_from_uuid(uuid),
        Some(PathBuf::from(asset.metadata().source_file.clone()))
    );

    let again = registry.load_asset_from_path(&source).unwrap();
    assert!(std::sync::Arc::ptr_eq(&asset, &again));
    assert_eq!(registry.loaded_count(), 1);

    let clip = registry.get_as::<AnimationClip>(uuid).unwrap();
    assert_eq!(clip.frame_count(), 2);
    assert!((clip.total_duration() - 0.3).abs() < 1e-6);
}

#[test]
fn reimport_evicts_so_next_load_sees_new_content() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("walk.anim");
    write_clip(&source, AssetUuid::from_raw(3), &[0.1]);

    let mut registry = registry_in(dir.path());
    let uuid = registry.load_asset_from_path(&source).unwrap().uuid();
    let before = registry.load_as::<AnimationClip>(uuid).unwrap();
    assert_eq!(before.frame_count(), 1);

    write_clip(&source, AssetUuid::from_raw(3), &[0.1, 0.1, 0.1]);
    let reimported = registry.reimport_asset(&source).unwrap();
    assert_eq!(reimported.uuid, uuid);
    assert_eq!(reimported.status, ImportStatus::Imported);
    assert!(!registry.is_loaded(uuid));

    let after = registry.load_as::<AnimationClip>(uuid).unwrap();
    assert_eq!(after.frame_count(), 3);
    assert_eq!(before.frame_count(), 1, "old handle is unchanged");
}

#[test]
fn scan_rebuilds_index_with_progress() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("levels")).unwrap();
    fs::write(root.join("levels/one.scene"), "{}").unwrap();
    fs::write(root.join("levels/two.scene"), "{}").unwrap();
    fs::write(root.join("broken.pxa"), b"garbage").unwrap();

    let mut importer_side = registry_in(root);
    let results = importer_side.import_directory(root, true);
    let uuid_one = results
        .iter()
        .find(|(p, _)| p.ends_with("one.scene"))
        .map(|(_, r)| r.as_ref().unwrap().uuid)
        .unwrap();

    let mut registry = registry_in(root);
    let mut calls = Vec::new();
    let indexed = registry.scan_all_packages(root, |done, total, path| {
        calls.push((done, total, path.to_path_buf()));
    });

    assert_eq!(indexed, 2);
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|(_, total, _)| *total == 3));
    assert_eq!(
        calls.iter().map(|(d, _, _)| *d).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    assert_eq!(registry.uuid_from_path(&root.join("levels/one.scene")), uuid_one);
    let scene = registry.load_as::<Scene>(uuid_one).unwrap();
    assert!(scene.document().is_object());
}

#[test]
fn malformed_package_on_disk_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("level.scene");
    fs::write(&source, "{}").unwrap();

    let mut registry = registry_in(dir.path());
    let imported = registry.reimport_asset(&source).unwrap();

    let mut bytes = fs::read(&imported.package_path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x55;
    fs::write(&imported.package_path, bytes).unwrap();

    assert!(registry.load_asset(imported.uuid).is_none());
    assert!(!registry.is_loaded(imported.uuid));
}

#[test]
fn failed_load_is_not_retried_until_reindexed() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("level.scene");
    fs::write(&source, "{}").unwrap();

    let mut registry = registry_in(dir.path());
    let imported = registry.reimport_asset(&source).unwrap();
    let good = fs::read(&imported.package_path).unwrap();
    fs::write(&imported.package_path, b"garbage").unwrap();

    assert!(registry.load_asset(imported.uuid).is_none());
    assert!(registry.has_failed(imported.uuid));

    // Repairing the file alone is not noticed: the failure is remembered.
    fs::write(&imported.package_path, &good).unwrap();
    assert!(registry.load_asset(imported.uuid).is_none());

    assert_eq!(registry.scan_all_packages(dir.path(), |_, _, _| {}), 1);
    assert!(!registry.has_failed(imported.uuid));
    assert!(registry.load_as::<Scene>(imported.uuid).is_some());
}

#[test]
fn reimport_clears_a_failed_load() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("level.scene");
    fs::write(&source, "{}").unwrap();

    let mut registry = registry_in(dir.path());
    let imported = registry.reimport_asset(&source).unwrap();
    fs::write(&imported.package_path, b"garbage").unwrap();
    assert!(registry.load_asset(imported.uuid).is_none());

    registry.reimport_asset(&source).unwrap();
    assert!(!registry.has_failed(imported.uuid));
    assert!(registry.load_asset(imported.uuid).is_some());
}

#[test]
fn import_all_follows_recursive_setting() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("levels")).unwrap();
    fs::write(root.join("menu.scene"), "{}").unwrap();
    fs::write(root.join("levels/one.scene"), "{}").unwrap();

    let mut config = AssetConfig::with_root(root);
    config.recursive_import = false;
    let mut shallow = AssetRegistry::new(config);
    assert_eq!(shallow.import_all().len(), 1);
    assert!(shallow.uuid_from_path(&root.join("menu.scene")).is_some());
    assert!(!root.join("levels/one.pxa").exists());

    let mut deep = registry_in(root);
    let results = deep.import_all();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(deep.registered_count(), 2);
}

#[test]
fn initialize_is_idempotent_and_shutdown_persists_cache() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("level.scene");
    fs::write(&source, "{}").unwrap();

    let mut registry = registry_in(dir.path());
    registry.initialize().unwrap();
    registry.initialize().unwrap();
    assert!(registry.is_initialized());

    let uuid = registry.load_asset_from_path(&source).unwrap().uuid();
    assert!(registry.total_memory_usage() > 0);
    registry.shutdown().unwrap();
    assert_eq!(registry.loaded_count(), 0);
    assert!(!registry.is_initialized());

    let mut next_run = registry_in(dir.path());
    next_run.initialize().unwrap();
    assert_eq!(next_run.uuid_from_path(&source), uuid);
}

#[test]
fn bundle_built_from_package_files_serves_registry() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("level.scene");
    fs::write(&source, r#"{"title": "bundled"}"#).unwrap();

    let mut editor = registry_in(dir.path());
    let imported = editor.reimport_asset(&source).unwrap();

    let mut writer = BundleWriter::new();
    assert_eq!(
        writer.add_package_file(&imported.package_path).unwrap(),
        imported.uuid
    );
    let bundle_path = dir.path().join("out/game.pxab");
    writer.write_to_file(&bundle_path).unwrap();

    let mut runtime = AssetRegistry::new(AssetConfig::with_root(dir.path().join("empty")));
    runtime
        .mount_bundle(fs::read(&bundle_path).unwrap())
        .unwrap();
    let scene = runtime.load_as::<Scene>(imported.uuid).unwrap();
    assert_eq!(scene.document()["title"], "bundled");
}
