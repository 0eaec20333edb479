//! Game bundles: many packages concatenated into one file.
//!
//! ```text
//! magic   b"PXAB"
//! version u32
//! count   u64
//! count × { uuid: u64, offset: u64, length: u64 }   offsets from file start
//! blobs   (complete .pxa packages)
//! ```
//!
//! All integers are little-endian.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::PackageError;
use crate::package::PackageCodec;
use crate::uuid::AssetUuid;

pub const BUNDLE_MAGIC: [u8; 4] = *b"PXAB";
pub const BUNDLE_VERSION: u32 = 1;

const BUNDLE_HEADER_SIZE: usize = 4 + 4 + 8;
const INDEX_RECORD_SIZE: usize = 8 * 3;

// ---------------------------------------------------------------------------
// BundleWriter
// ---------------------------------------------------------------------------

/// Collects packages and writes them as one bundle.
#[derive(Debug, Default)]
pub struct BundleWriter {
    packages: BTreeMap<AssetUuid, Vec<u8>>,
}

impl BundleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package file. Its header is validated and its UUID becomes the
    /// bundle key; a later package with the same UUID replaces the earlier.
    pub fn add_package_file(&mut self, path: &Path) -> Result<AssetUuid, PackageError> {
        let bytes = fs::read(path).map_err(|e| PackageError::io(path, e))?;
        self.add_package_bytes(bytes)
    }

    pub fn add_package_bytes(&mut self, bytes: Vec<u8>) -> Result<AssetUuid, PackageError> {
        let uuid = PackageCodec::load_metadata_from_memory(&bytes)?.uuid;
        self.packages.insert(uuid, bytes);
        Ok(uuid)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let index_end = BUNDLE_HEADER_SIZE + self.packages.len() * INDEX_RECORD_SIZE;
        let blobs_len: usize = self.packages.values().map(Vec::len).sum();
        let mut out = Vec::with_capacity(index_end + blobs_len);

        out.extend_from_slice(&BUNDLE_MAGIC);
        out.extend_from_slice(&BUNDLE_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.packages.len() as u64).to_le_bytes());

        let mut offset = index_end as u64;
        for (uuid, blob) in &self.packages {
            out.extend_from_slice(&uuid.to_raw().to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&(blob.len() as u64).to_le_bytes());
            offset += blob.len() as u64;
        }
        for blob in self.packages.values() {
            out.extend_from_slice(blob);
        }
        out
    }

    pub fn write_to_file(&self, path: &Path) -> Result<(), PackageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PackageError::io(parent, e))?;
        }
        let mut file = fs::File::create(path).map_err(|e| PackageError::io(path, e))?;
        file.write_all(&self.to_bytes())
            .map_err(|e| PackageError::io(path, e))?;
        tracing::info!(path = %path.display(), packages = self.packages.len(), "wrote game bundle");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GameBundle
// ---------------------------------------------------------------------------

/// A parsed bundle. Blobs are served as slices of the owned buffer.
pub struct GameBundle {
    data: Vec<u8>,
    index: BTreeMap<AssetUuid, (usize, usize)>,
}

impl std::fmt::Debug for GameBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameBundle")
            .field("bytes", &self.data.len())
            .field("assets", &self.index.len())
            .finish()
    }
}

impl GameBundle {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, PackageError> {
        if data.len() < BUNDLE_HEADER_SIZE {
            return Err(PackageError::Truncated {
                needed: BUNDLE_HEADER_SIZE as u64,
                available: data.len() as u64,
            });
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&data[..4]);
        if magic != BUNDLE_MAGIC {
            return Err(PackageError::BadMagic {
                found: magic,
                expected: BUNDLE_MAGIC,
            });
        }

        let truncated = |_| PackageError::Truncated {
            needed: BUNDLE_HEADER_SIZE as u64,
            available: data.len() as u64,
        };
        let mut cursor = Cursor::new(&data[4..]);
        let version = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        if version > BUNDLE_VERSION {
            return Err(PackageError::UnsupportedVersion {
                found: version,
                supported: BUNDLE_VERSION,
            });
        }
        let count = cursor.read_u64::<LittleEndian>().map_err(truncated)?;

        let index_end = (count as u128) * INDEX_RECORD_SIZE as u128 + BUNDLE_HEADER_SIZE as u128;
        if index_end > data.len() as u128 {
            return Err(PackageError::Truncated {
                needed: u64::try_from(index_end).unwrap_or(u64::MAX),
                available: data.len() as u64,
            });
        }

        let mut index = BTreeMap::new();
        for _ in 0..count {
            let uuid = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            let offset = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            let length = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            let end = offset.checked_add(length).filter(|&e| e <= data.len() as u64);
            let Some(end) = end else {
                return Err(PackageError::Truncated {
                    needed: offset.saturating_add(length),
                    available: data.len() as u64,
                });
            };
            index.insert(AssetUuid::from_raw(uuid), (offset as usize, end as usize));
        }

        Ok(Self { data, index })
    }

    pub fn from_file(path: &Path) -> Result<Self, PackageError> {
        let data = fs::read(path).map_err(|e| PackageError::io(path, e))?;
        Self::from_bytes(data)
    }

    /// Package bytes stored for `uuid`.
    pub fn blob(&self, uuid: AssetUuid) -> Option<&[u8]> {
        let &(start, end) = self.index.get(&uuid)?;
        Some(&self.data[start..end])
    }

    pub fn contains(&self, uuid: AssetUuid) -> bool {
        self.index.contains_key(&uuid)
    }

    /// Bundled UUIDs in ascending order.
    pub fn uuids(&self) -> impl Iterator<Item = AssetUuid> + '_ {
        self.index.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{AssetMetadata, AssetType};

    fn package(uuid: u64, payload: &[u8]) -> Vec<u8> {
        let meta = AssetMetadata {
            uuid: AssetUuid::from_raw(uuid),
            asset_type: AssetType::Scene,
            name: format!("scene{uuid}"),
            source_file: format!("datas/scene{uuid}.scene"),
            version: 1,
            ..Default::default()
        };
        PackageCodec::to_bytes(&meta, payload).unwrap()
    }

    #[test]
    fn bundle_serves_each_blob() {
        let mut writer = BundleWriter::new();
        writer.add_package_bytes(package(2, b"{\"b\":2}")).unwrap();
        writer.add_package_bytes(package(1, b"{\"a\":1}")).unwrap();
        let bundle = GameBundle::from_bytes(writer.to_bytes()).unwrap();

        assert_eq!(bundle.len(), 2);
        let ids: Vec<u64> = bundle.uuids().map(AssetUuid::to_raw).collect();
        assert_eq!(ids, vec![1, 2]);
        let (meta, data) =
            PackageCodec::load_from_memory(bundle.blob(AssetUuid::from_raw(2)).unwrap()).unwrap();
        assert_eq!(meta.name, "scene2");
        assert_eq!(data, b"{\"b\":2}");
        assert!(bundle.blob(AssetUuid::from_raw(3)).is_none());
    }

    #[test]
    fn non_package_bytes_are_rejected_by_writer() {
        let mut writer = BundleWriter::new();
        assert!(writer.add_package_bytes(b"nope".to_vec()).is_err());
        assert!(writer.is_empty());
    }

    #[test]
    fn bad_bundle_magic() {
        let err = GameBundle::from_bytes(b"XXXX\x01\0\0\0\0\0\0\0\0\0\0\0".to_vec()).unwrap_err();
        assert!(matches!(err, PackageError::BadMagic { .. }));
    }

    #[test]
    fn index_pointing_past_end_is_truncated() {
        let mut writer = BundleWriter::new();
        writer.add_package_bytes(package(1, b"{}")).unwrap();
        let mut bytes = writer.to_bytes();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            GameBundle::from_bytes(bytes),
            Err(PackageError::Truncated { .. })
        ));
    }

    #[test]
    fn huge_count_is_truncated_not_allocated() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"PXAB");
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            GameBundle::from_bytes(bytes),
            Err(PackageError::Truncated { .. })
        ));
    }
}
