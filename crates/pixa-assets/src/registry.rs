//! The [`AssetRegistry`]: the one place that turns a UUID or source path into
//! a loaded asset.
//!
//! The registry keeps three things:
//!
//! 1. A bidirectional index between source paths and UUIDs, each UUID also
//!    knowing where its package bytes live (a `.pxa` file or a mounted game
//!    bundle).
//! 2. A cache of loaded assets, shared out as `Arc<dyn Asset>`.
//! 3. The [`AssetImporter`] and its persistent UUID cache.
//!
//! Per UUID the lifecycle is: unregistered → registered (location known) →
//! loaded → back to registered on unload. The index survives unloads. A
//! package that fails to decode is remembered as failed and not read again
//! until its UUID is registered anew by an import, scan or bundle mount.
//!
//! The registry is an ordinary value, constructed once by the engine and
//! passed by reference to whatever needs assets.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::asset::{create_asset, downcast_asset, Asset};
use crate::bundle::GameBundle;
use crate::config::AssetConfig;
use crate::error::{AssetError, PackageError};
use crate::importer::{AssetImporter, ImportedAsset};
use crate::metadata::{normalize_path, AssetMetadata};
use crate::package::{PackageCodec, PACKAGE_EXTENSION};
use crate::uuid::AssetUuid;

/// Where the package bytes for a registered UUID come from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PackageLocation {
    File(PathBuf),
    /// Index into `AssetRegistry::bundles`.
    Bundle(usize),
}

#[derive(Debug, Clone)]
struct IndexEntry {
    source_path: String,
    location: PackageLocation,
}

/// In-memory asset cache and path ↔ UUID index.
#[derive(Debug)]
pub struct AssetRegistry {
    config: AssetConfig,
    importer: AssetImporter,
    index: HashMap<AssetUuid, IndexEntry>,
    path_to_uuid: HashMap<String, AssetUuid>,
    loaded: HashMap<AssetUuid, Arc<dyn Asset>>,
    failed: HashSet<AssetUuid>,
    bundles: Vec<GameBundle>,
    initialized: bool,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new(AssetConfig::default())
    }
}

impl AssetRegistry {
    pub fn new(config: AssetConfig) -> Self {
        let importer = AssetImporter::new(config.uuid_cache_path.clone());
        Self {
            config,
            importer,
            index: HashMap::new(),
            path_to_uuid: HashMap::new(),
            loaded: HashMap::new(),
            failed: HashSet::new(),
            bundles: Vec::new(),
            initialized: false,
        }
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    pub fn importer(&self) -> &AssetImporter {
        &self.importer
    }

    pub fn importer_mut(&mut self) -> &mut AssetImporter {
        &mut self.importer
    }

    // -- lifecycle ----------------------------------------------------------

    /// Load the UUID cache. Calling this again is a no-op.
    pub fn initialize(&mut self) -> Result<(), AssetError> {
        if self.initialized {
            return Ok(());
        }
        let count = self.importer.load_uuid_cache()?;
        self.initialized = true;
        tracing::info!(cached_uuids = count, "asset registry initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Unload everything and persist the UUID cache.
    pub fn shutdown(&mut self) -> Result<(), AssetError> {
        self.unload_all();
        self.importer.save_uuid_cache()?;
        self.initialized = false;
        tracing::info!("asset registry shut down");
        Ok(())
    }

    // -- loading ------------------------------------------------------------

    /// The asset for `uuid`, decoding its package on first request.
    ///
    /// Returns `None` (and logs) when the UUID is unregistered, the package
    /// is malformed, or the payload does not decode. Failures are logged
    /// once; later requests for the same UUID return `None` without I/O.
    pub fn load_asset(&mut self, uuid: AssetUuid) -> Option<Arc<dyn Asset>> {
        if let Some(asset) = self.loaded.get(&uuid) {
            tracing::trace!(uuid = %uuid, "asset cache hit");
            return Some(Arc::clone(asset));
        }
        if self.failed.contains(&uuid) {
            tracing::trace!(uuid = %uuid, "asset previously failed to load");
            return None;
        }

        let Some(entry) = self.index.get(&uuid) else {
            tracing::warn!(uuid = %uuid, "load requested for unregistered asset");
            return None;
        };

        let (metadata, data) = match self.read_package(uuid, &entry.location) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::error!(uuid = %uuid, source = %entry.source_path, error = %e, "malformed package");
                self.failed.insert(uuid);
                return None;
            }
        };

        let asset = match decode_asset(metadata, &data) {
            Ok(asset) => asset,
            Err(e) => {
                tracing::error!(uuid = %uuid, source = %entry.source_path, error = %e, "failed to decode asset");
                self.failed.insert(uuid);
                return None;
            }
        };

        tracing::debug!(
            uuid = %uuid,
            asset_type = %asset.asset_type(),
            bytes = asset.memory_usage(),
            "loaded asset"
        );
        self.loaded.insert(uuid, Arc::clone(&asset));
        Some(asset)
    }

    /// Load by source path, importing and indexing it first when unknown.
    pub fn load_asset_from_path(&mut self, path: &Path) -> Option<Arc<dyn Asset>> {
        let key = normalize_path(path);
        if let Some(&uuid) = self.path_to_uuid.get(&key) {
            return self.load_asset(uuid);
        }

        match self.importer.import_asset(path, false) {
            Ok(imported) => {
                self.register_import(&imported);
                self.load_asset(imported.uuid)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "import failed");
                None
            }
        }
    }

    /// Cached asset, if loaded. Never touches disk.
    pub fn get_asset(&self, uuid: AssetUuid) -> Option<Arc<dyn Asset>> {
        self.loaded.get(&uuid).cloned()
    }

    /// [`load_asset`](Self::load_asset) followed by a downcast to `T`.
    pub fn load_as<T: Asset>(&mut self, uuid: AssetUuid) -> Option<Arc<T>> {
        let asset = self.load_asset(uuid)?;
        let found = asset.asset_type();
        let typed = downcast_asset::<T>(asset);
        if typed.is_none() {
            tracing::warn!(
                uuid = %uuid,
                found = %found,
                expected = std::any::type_name::<T>(),
                "asset has unexpected type"
            );
        }
        typed
    }

    /// [`get_asset`](Self::get_asset) followed by a downcast to `T`.
    pub fn get_as<T: Asset>(&self, uuid: AssetUuid) -> Option<Arc<T>> {
        downcast_asset::<T>(self.get_asset(uuid)?)
    }

    pub fn is_loaded(&self, uuid: AssetUuid) -> bool {
        self.loaded.contains_key(&uuid)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn total_memory_usage(&self) -> usize {
        self.loaded.values().map(|a| a.memory_usage()).sum()
    }

    // -- unloading ----------------------------------------------------------

    /// Drop `uuid` from the cache. Its decoded data is released right away
    /// when nobody else holds the asset; outside holders keep their copy.
    ///
    /// Returns `false` if it was not loaded.
    pub fn unload_asset(&mut self, uuid: AssetUuid) -> bool {
        match self.loaded.remove(&uuid) {
            Some(asset) => {
                release(asset);
                tracing::debug!(uuid = %uuid, "unloaded asset");
                true
            }
            None => false,
        }
    }

    pub fn unload_all(&mut self) {
        let count = self.loaded.len();
        for (_, asset) in self.loaded.drain() {
            release(asset);
        }
        if count > 0 {
            tracing::debug!(count, "unloaded all assets");
        }
    }

    // -- importing ----------------------------------------------------------

    /// Force a re-import of `path` and evict the cached asset so the next
    /// load decodes the new package.
    pub fn reimport_asset(&mut self, path: &Path) -> Result<ImportedAsset, AssetError> {
        let imported = self.importer.import_asset(path, true)?;
        self.register_import(&imported);
        self.unload_asset(imported.uuid);
        Ok(imported)
    }

    /// Import every recognized source under `dir` and index the results.
    pub fn import_directory(
        &mut self,
        dir: &Path,
        recursive: bool,
    ) -> Vec<(PathBuf, Result<ImportedAsset, AssetError>)> {
        let results = self.importer.import_directory(dir, recursive);
        for imported in results.iter().filter_map(|(_, r)| r.as_ref().ok()) {
            self.register_import(imported);
        }
        results
    }

    /// Import the configured asset root, descending into subdirectories when
    /// `recursive_import` is set.
    pub fn import_all(&mut self) -> Vec<(PathBuf, Result<ImportedAsset, AssetError>)> {
        let root = self.config.asset_root.clone();
        let recursive = self.config.recursive_import;
        self.import_directory(&root, recursive)
    }

    /// Rebuild the index from every `.pxa` file under `root`, reading only
    /// headers and metadata.
    ///
    /// `progress` receives `(done, total, path)` after each file. Returns the
    /// number of packages indexed.
    pub fn scan_all_packages<F>(&mut self, root: &Path, mut progress: F) -> usize
    where
        F: FnMut(usize, usize, &Path),
    {
        let packages: Vec<PathBuf> = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(PACKAGE_EXTENSION))
            })
            .collect();

        let total = packages.len();
        let mut indexed = 0;
        for (i, package) in packages.iter().enumerate() {
            match PackageCodec::load_metadata_only(package) {
                Ok(meta) if meta.uuid.is_some() => {
                    self.importer
                        .force_uuid(Path::new(&meta.source_file), meta.uuid);
                    self.register(
                        meta.uuid,
                        meta.source_file,
                        PackageLocation::File(package.clone()),
                    );
                    indexed += 1;
                }
                Ok(_) => {
                    tracing::warn!(path = %package.display(), "package has no uuid, skipped");
                }
                Err(e) => {
                    tracing::warn!(path = %package.display(), error = %e, "unreadable package, skipped");
                }
            }
            progress(i + 1, total, package);
        }

        tracing::info!(root = %root.display(), indexed, total, "scanned packages");
        indexed
    }

    /// Register every package in a game bundle. Their loads are served from
    /// the bundle's memory.
    ///
    /// Returns the number of assets registered.
    pub fn mount_bundle(&mut self, bytes: Vec<u8>) -> Result<usize, PackageError> {
        let bundle = GameBundle::from_bytes(bytes)?;
        let slot = self.bundles.len();

        let mut entries = Vec::with_capacity(bundle.len());
        for uuid in bundle.uuids() {
            let Some(blob) = bundle.blob(uuid) else {
                continue;
            };
            let meta = PackageCodec::load_metadata_from_memory(blob)?;
            entries.push((uuid, meta.source_file));
        }

        self.bundles.push(bundle);
        let count = entries.len();
        for (uuid, source) in entries {
            self.register(uuid, source, PackageLocation::Bundle(slot));
        }
        tracing::info!(assets = count, "mounted game bundle");
        Ok(count)
    }

    // -- index --------------------------------------------------------------

    /// UUID registered for `path`, else the importer's cached assignment,
    /// else [`AssetUuid::NONE`].
    pub fn uuid_from_path(&self, path: &Path) -> AssetUuid {
        self.path_to_uuid
            .get(&normalize_path(path))
            .copied()
            .or_else(|| self.importer.uuid_for(path))
            .unwrap_or(AssetUuid::NONE)
    }

    /// Source path registered for `uuid`.
    pub fn path_from_uuid(&self, uuid: AssetUuid) -> Option<PathBuf> {
        self.index
            .get(&uuid)
            .map(|entry| PathBuf::from(&entry.source_path))
    }

    pub fn is_registered(&self, uuid: AssetUuid) -> bool {
        self.index.contains_key(&uuid)
    }

    pub fn registered_count(&self) -> usize {
        self.index.len()
    }

    /// `true` when the last load of `uuid` failed and has not been retried.
    pub fn has_failed(&self, uuid: AssetUuid) -> bool {
        self.failed.contains(&uuid)
    }

    fn register_import(&mut self, imported: &ImportedAsset) {
        self.register(
            imported.uuid,
            normalize_path(&imported.source_path),
            PackageLocation::File(imported.package_path.clone()),
        );
    }

    fn register(&mut self, uuid: AssetUuid, source_path: String, location: PackageLocation) {
        if let Some(previous) = self.index.get(&uuid) {
            if previous.source_path != source_path {
                self.path_to_uuid.remove(&previous.source_path);
            }
        }
        self.failed.remove(&uuid);
        self.path_to_uuid.insert(source_path.clone(), uuid);
        self.index.insert(
            uuid,
            IndexEntry {
                source_path,
                location,
            },
        );
    }

    fn read_package(
        &self,
        uuid: AssetUuid,
        location: &PackageLocation,
    ) -> Result<(AssetMetadata, Vec<u8>), PackageError> {
        match location {
            PackageLocation::File(path) => PackageCodec::load_from_file(path),
            PackageLocation::Bundle(slot) => {
                let blob = self
                    .bundles
                    .get(*slot)
                    .and_then(|bundle| bundle.blob(uuid))
                    .ok_or(PackageError::Truncated {
                        needed: 1,
                        available: 0,
                    })?;
                PackageCodec::load_from_memory(blob)
            }
        }
    }
}

/// Construct, fill and share an asset from decoded package parts.
fn decode_asset(metadata: AssetMetadata, data: &[u8]) -> Result<Arc<dyn Asset>, AssetError> {
    let mut asset = create_asset(metadata.asset_type)
        .ok_or_else(|| AssetError::UnknownType(PathBuf::from(&metadata.source_file)))?;
    asset.set_metadata(metadata);
    asset.load(data)?;
    Ok(Arc::from(asset))
}

/// Unload an evicted asset if the registry held the last reference.
fn release(mut asset: Arc<dyn Asset>) {
    if let Some(asset) = Arc::get_mut(&mut asset) {
        asset.unload();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
