//! Source file import and the persistent path → UUID cache.
//!
//! The importer turns a source file (PNG, WAV, scene JSON, ...) into a `.pxa`
//! package next to it, assigning a UUID the first time a path is seen. The
//! path → UUID map is persisted to a small binary sidecar so identities
//! survive restarts:
//!
//! ```text
//! count: u64
//! count × { path_len: u64, path: [u8; path_len] (UTF-8), uuid: u64 }
//! ```
//!
//! All integers are little-endian.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use walkdir::WalkDir;

use crate::encode::encode_source;
use crate::error::AssetError;
use crate::metadata::{
    modified_nanos, normalize_path, now_nanos, AssetMetadata, AssetType, METADATA_VERSION,
};
use crate::package::{PackageCodec, PACKAGE_EXTENSION};
use crate::uuid::AssetUuid;

/// Default location of the UUID cache sidecar.
pub const DEFAULT_UUID_CACHE_PATH: &str = "datas/.asset_uuid_cache";

// ---------------------------------------------------------------------------
// Type detection
// ---------------------------------------------------------------------------

/// Asset type implied by the file extension (case-insensitive).
pub fn detect_asset_type(path: &Path) -> AssetType {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return AssetType::Unknown;
    };
    match ext.to_ascii_lowercase().as_str() {
        "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif" => AssetType::Texture,
        "wav" | "ogg" | "mp3" | "flac" => AssetType::Audio,
        "scene" => AssetType::Scene,
        "spritesheet" => AssetType::SpriteSheet,
        "anim" => AssetType::AnimationClip,
        "animator" => AssetType::AnimatorController,
        _ => AssetType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Import results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    /// A package was (re)written.
    Imported,
    /// The existing package was fresh; nothing was written.
    UpToDate,
}

/// Outcome of importing one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedAsset {
    pub uuid: AssetUuid,
    pub asset_type: AssetType,
    pub source_path: PathBuf,
    pub package_path: PathBuf,
    pub status: ImportStatus,
}

// ---------------------------------------------------------------------------
// AssetImporter
// ---------------------------------------------------------------------------

/// Imports source files into packages and owns the path → UUID cache.
#[derive(Debug)]
pub struct AssetImporter {
    cache_path: PathBuf,
    uuids: BTreeMap<String, AssetUuid>,
}

impl Default for AssetImporter {
    fn default() -> Self {
        Self::new(DEFAULT_UUID_CACHE_PATH)
    }
}

impl AssetImporter {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            uuids: BTreeMap::new(),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    // -- UUID assignment ----------------------------------------------------

    /// UUID of `path`, assigning a fresh one on first sight.
    pub fn get_or_create_uuid(&mut self, path: &Path) -> AssetUuid {
        let key = normalize_path(path);
        *self.uuids.entry(key).or_insert_with(|| {
            let uuid = AssetUuid::generate();
            tracing::debug!(path = %path.display(), uuid = %uuid, "assigned new asset uuid");
            uuid
        })
    }

    /// Pin `path` to `uuid`, replacing any previous assignment.
    pub fn force_uuid(&mut self, path: &Path, uuid: AssetUuid) {
        self.uuids.insert(normalize_path(path), uuid);
    }

    pub fn uuid_for(&self, path: &Path) -> Option<AssetUuid> {
        self.uuids.get(&normalize_path(path)).copied()
    }

    /// Every known `(normalized path, uuid)` pair, ordered by path.
    pub fn known_uuids(&self) -> impl Iterator<Item = (&str, AssetUuid)> {
        self.uuids.iter().map(|(p, u)| (p.as_str(), *u))
    }

    // -- cache persistence --------------------------------------------------

    /// Merge the on-disk cache into memory. A missing file is not an error.
    ///
    /// Returns the number of records read.
    pub fn load_uuid_cache(&mut self) -> Result<usize, AssetError> {
        let bytes = match fs::read(&self.cache_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.cache_path.display(), "no uuid cache on disk");
                return Ok(0);
            }
            Err(e) => return Err(AssetError::io(&self.cache_path, e)),
        };

        let records = parse_uuid_cache(&bytes)?;
        let count = records.len();
        self.uuids.extend(records);
        tracing::info!(path = %self.cache_path.display(), count, "loaded uuid cache");
        Ok(count)
    }

    /// Write the whole map to the cache file, creating parent directories.
    pub fn save_uuid_cache(&self) -> Result<(), AssetError> {
        if let Some(parent) = self
            .cache_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
        }
        let file =
            fs::File::create(&self.cache_path).map_err(|e| AssetError::io(&self.cache_path, e))?;
        let mut writer = BufWriter::new(file);
        write_uuid_cache(&mut writer, &self.uuids)
            .and_then(|()| writer.flush())
            .map_err(|e| AssetError::io(&self.cache_path, e))?;
        tracing::debug!(
            path = %self.cache_path.display(),
            count = self.uuids.len(),
            "saved uuid cache"
        );
        Ok(())
    }

    // -- import -------------------------------------------------------------

    /// Import one source file into its package.
    ///
    /// Unless `force` is set, a package that is at least as new as its source
    /// is left untouched and reported as [`ImportStatus::UpToDate`].
    pub fn import_asset(&mut self, path: &Path, force: bool) -> Result<ImportedAsset, AssetError> {
        let asset_type = detect_asset_type(path);
        if asset_type == AssetType::Unknown {
            return Err(AssetError::UnknownType(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(AssetError::SourceNotFound(path.to_path_buf()));
        }

        let package_path = PackageCodec::package_path_for(path);
        self.adopt_package_uuid(path, &package_path);
        let uuid = self.get_or_create_uuid(path);

        if !force && !PackageCodec::needs_reimport(path) {
            tracing::debug!(path = %path.display(), uuid = %uuid, "package up to date");
            return Ok(ImportedAsset {
                uuid,
                asset_type,
                source_path: path.to_path_buf(),
                package_path,
                status: ImportStatus::UpToDate,
            });
        }

        let source = fs::read(path).map_err(|e| AssetError::io(path, e))?;
        let payload = encode_source(asset_type, path, &source)?;
        let metadata = AssetMetadata {
            uuid,
            asset_type,
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            source_file: normalize_path(path),
            import_timestamp: now_nanos(),
            source_timestamp: modified_nanos(path).unwrap_or(0),
            version: METADATA_VERSION,
        };
        PackageCodec::save_to_file(&package_path, &metadata, &payload)?;

        tracing::info!(
            path = %path.display(),
            uuid = %uuid,
            asset_type = %asset_type,
            bytes = payload.len(),
            "imported asset"
        );
        Ok(ImportedAsset {
            uuid,
            asset_type,
            source_path: path.to_path_buf(),
            package_path,
            status: ImportStatus::Imported,
        })
    }

    /// Import every recognized file under `dir`.
    ///
    /// Package files and unknown extensions are skipped. The UUID cache is
    /// saved once at the end.
    pub fn import_directory(
        &mut self,
        dir: &Path,
        recursive: bool,
    ) -> Vec<(PathBuf, Result<ImportedAsset, AssetError>)> {
        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut results = Vec::new();

        for entry in WalkDir::new(dir).max_depth(max_depth).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_package = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(PACKAGE_EXTENSION));
            if is_package || detect_asset_type(path) == AssetType::Unknown {
                continue;
            }

            let result = self.import_asset(path, false);
            if let Err(e) = &result {
                tracing::warn!(path = %path.display(), error = %e, "import failed");
            }
            results.push((path.to_path_buf(), result));
        }

        if let Err(e) = self.save_uuid_cache() {
            tracing::warn!(error = %e, "failed to save uuid cache after directory import");
        }
        results
    }

    /// When the cache has no entry for `source` but a package already exists,
    /// keep the package's UUID instead of minting a new one.
    fn adopt_package_uuid(&mut self, source: &Path, package: &Path) {
        if self.uuid_for(source).is_some() || !package.is_file() {
            return;
        }
        match PackageCodec::load_metadata_only(package) {
            Ok(meta) if meta.uuid.is_some() => {
                tracing::debug!(path = %source.display(), uuid = %meta.uuid, "recovered uuid from package");
                self.force_uuid(source, meta.uuid);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %package.display(), error = %e, "unreadable package, assigning new uuid");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Cache encoding
// ---------------------------------------------------------------------------

fn write_uuid_cache<W: Write>(
    writer: &mut W,
    uuids: &BTreeMap<String, AssetUuid>,
) -> std::io::Result<()> {
    writer.write_u64::<LittleEndian>(uuids.len() as u64)?;
    for (path, uuid) in uuids {
        writer.write_u64::<LittleEndian>(path.len() as u64)?;
        writer.write_all(path.as_bytes())?;
        writer.write_u64::<LittleEndian>(uuid.to_raw())?;
    }
    Ok(())
}

fn parse_uuid_cache(bytes: &[u8]) -> Result<Vec<(String, AssetUuid)>, AssetError> {
    let corrupt = |e: std::io::Error| AssetError::parse("uuid cache", e);
    let mut cursor = Cursor::new(bytes);
    let count = cursor.read_u64::<LittleEndian>().map_err(corrupt)?;

    let mut records = Vec::new();
    for _ in 0..count {
        let len = cursor.read_u64::<LittleEndian>().map_err(corrupt)?;
        let remaining = bytes.len() as u64 - cursor.position();
        if len > remaining {
            return Err(AssetError::parse(
                "uuid cache",
                format!("path length {len} exceeds remaining {remaining} bytes"),
            ));
        }
        let mut raw = vec![0u8; len as usize];
        cursor.read_exact(&mut raw).map_err(corrupt)?;
        let path = String::from_utf8(raw).map_err(|e| AssetError::parse("uuid cache", e))?;
        let uuid = cursor.read_u64::<LittleEndian>().map_err(corrupt)?;
        records.push((path, AssetUuid::from_raw(uuid)));
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_is_case_insensitive() {
        assert_eq!(detect_asset_type(Path::new("a/B.PNG")), AssetType::Texture);
        assert_eq!(detect_asset_type(Path::new("x.Jpeg")), AssetType::Texture);
        assert_eq!(detect_asset_type(Path::new("x.flac")), AssetType::Audio);
        assert_eq!(detect_asset_type(Path::new("x.scene")), AssetType::Scene);
        assert_eq!(
            detect_asset_type(Path::new("x.spritesheet")),
            AssetType::SpriteSheet
        );
        assert_eq!(detect_asset_type(Path::new("x.anim")), AssetType::AnimationClip);
        assert_eq!(
            detect_asset_type(Path::new("x.animator")),
            AssetType::AnimatorController
        );
        assert_eq!(detect_asset_type(Path::new("x.txt")), AssetType::Unknown);
        assert_eq!(detect_asset_type(Path::new("noext")), AssetType::Unknown);
    }

    #[test]
    fn uuid_assignment_is_stable_per_normalized_path() {
        let mut importer = AssetImporter::new("unused");
        let a = importer.get_or_create_uuid(Path::new("datas/hero.png"));
        let b = importer.get_or_create_uuid(Path::new("./datas/hero.png"));
        let c = importer.get_or_create_uuid(Path::new("datas/enemy.png"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn force_uuid_overrides() {
        let mut importer = AssetImporter::new("unused");
        let path = Path::new("datas/hero.png");
        importer.get_or_create_uuid(path);
        importer.force_uuid(path, AssetUuid::from_raw(7));
        assert_eq!(importer.uuid_for(path), Some(AssetUuid::from_raw(7)));
    }

    #[test]
    fn cache_encoding_matches_layout() {
        let mut map = BTreeMap::new();
        map.insert("ab".to_owned(), AssetUuid::from_raw(9));
        let mut out = Vec::new();
        write_uuid_cache(&mut out, &map).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.extend_from_slice(b"ab");
        expected.extend_from_slice(&9u64.to_le_bytes());
        assert_eq!(out, expected);

        let parsed = parse_uuid_cache(&out).unwrap();
        assert_eq!(parsed, vec![("ab".to_owned(), AssetUuid::from_raw(9))]);
    }

    #[test]
    fn corrupt_cache_is_reported() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&1_000u64.to_le_bytes());
        bytes.extend_from_slice(b"short");
        assert!(matches!(
            parse_uuid_cache(&bytes),
            Err(AssetError::Parse { .. })
        ));
    }

    #[test]
    fn unknown_extension_is_rejected_before_io() {
        let mut importer = AssetImporter::new("unused");
        let err = importer
            .import_asset(Path::new("does/not/exist.txt"), false)
            .unwrap_err();
        assert!(matches!(err, AssetError::UnknownType(_)));
    }

    #[test]
    fn missing_source_is_reported() {
        let mut importer = AssetImporter::new("unused");
        let err = importer
            .import_asset(Path::new("does/not/exist.png"), false)
            .unwrap_err();
        assert!(matches!(err, AssetError::SourceNotFound(_)));
    }
}
