//! `.pxa` package codec.
//!
//! A package holds exactly one imported asset:
//!
//! ```text
//! +-----------------------------+  0
//! | header (52 bytes, LE)       |
//! +-----------------------------+  52
//! | metadata (bincode)          |
//! +-----------------------------+  52 + metadata_size
//! | payload (type-specific)     |
//! +-----------------------------+  52 + metadata_size + data_size
//! ```
//!
//! The header carries the fixed-width fields (type code, uuid, section sizes,
//! timestamps). The metadata section carries the variable-length fields plus
//! a BLAKE3 digest of the payload, checked on every full load.

use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::PackageError;
use crate::metadata::{modified_nanos, AssetMetadata, AssetType};
use crate::uuid::AssetUuid;

/// `b"PXA\0"`.
pub const PACKAGE_MAGIC: [u8; 4] = *b"PXA\0";

/// Newest format revision this build reads and the one it writes.
pub const PACKAGE_VERSION: u32 = 1;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 52;

/// File extension of packages.
pub const PACKAGE_EXTENSION: &str = "pxa";

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Fixed-width part of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageHeader {
    pub version: u32,
    pub asset_type: AssetType,
    pub uuid: AssetUuid,
    pub metadata_size: u64,
    pub data_size: u64,
    pub import_timestamp: u64,
    pub source_timestamp: u64,
}

impl PackageHeader {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&PACKAGE_MAGIC)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u16::<LittleEndian>(self.asset_type.code())?;
        writer.write_u16::<LittleEndian>(0)?; // reserved
        writer.write_u64::<LittleEndian>(self.uuid.to_raw())?;
        writer.write_u64::<LittleEndian>(self.metadata_size)?;
        writer.write_u64::<LittleEndian>(self.data_size)?;
        writer.write_u64::<LittleEndian>(self.import_timestamp)?;
        writer.write_u64::<LittleEndian>(self.source_timestamp)?;
        Ok(())
    }

    /// Parse and validate the first [`HEADER_SIZE`] bytes of `bytes`.
    fn parse(bytes: &[u8]) -> Result<Self, PackageError> {
        if bytes.len() < HEADER_SIZE {
            return Err(PackageError::Truncated {
                needed: HEADER_SIZE as u64,
                available: bytes.len() as u64,
            });
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        if magic != PACKAGE_MAGIC {
            return Err(PackageError::BadMagic {
                found: magic,
                expected: PACKAGE_MAGIC,
            });
        }

        let mut cursor = Cursor::new(&bytes[4..HEADER_SIZE]);
        let read = |e: std::io::Error| PackageError::Metadata(format!("header: {e}"));
        let version = cursor.read_u32::<LittleEndian>().map_err(read)?;
        if version > PACKAGE_VERSION {
            return Err(PackageError::UnsupportedVersion {
                found: version,
                supported: PACKAGE_VERSION,
            });
        }
        let type_code = cursor.read_u16::<LittleEndian>().map_err(read)?;
        let _reserved = cursor.read_u16::<LittleEndian>().map_err(read)?;
        let uuid = cursor.read_u64::<LittleEndian>().map_err(read)?;
        let metadata_size = cursor.read_u64::<LittleEndian>().map_err(read)?;
        let data_size = cursor.read_u64::<LittleEndian>().map_err(read)?;
        let import_timestamp = cursor.read_u64::<LittleEndian>().map_err(read)?;
        let source_timestamp = cursor.read_u64::<LittleEndian>().map_err(read)?;

        Ok(Self {
            version,
            asset_type: AssetType::from_code(type_code),
            uuid: AssetUuid::from_raw(uuid),
            metadata_size,
            data_size,
            import_timestamp,
            source_timestamp,
        })
    }

    /// Total package length implied by the header, `None` on overflow.
    fn total_len(&self) -> Option<u64> {
        (HEADER_SIZE as u64)
            .checked_add(self.metadata_size)?
            .checked_add(self.data_size)
    }
}

// ---------------------------------------------------------------------------
// Metadata section
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct MetadataSection {
    name: String,
    source_file: String,
    version: u32,
    payload_hash: String,
}

fn encode_section(section: &MetadataSection) -> Result<Vec<u8>, PackageError> {
    bincode::serde::encode_to_vec(section, bincode::config::standard())
        .map_err(|e| PackageError::Metadata(e.to_string()))
}

fn decode_section(bytes: &[u8]) -> Result<MetadataSection, PackageError> {
    let (section, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map_err(|e| PackageError::Metadata(e.to_string()))?;
    Ok(section)
}

fn payload_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

fn assemble(header: &PackageHeader, section: MetadataSection) -> AssetMetadata {
    AssetMetadata {
        uuid: header.uuid,
        asset_type: header.asset_type,
        name: section.name,
        source_file: section.source_file,
        import_timestamp: header.import_timestamp,
        source_timestamp: header.source_timestamp,
        version: section.version,
    }
}

// ---------------------------------------------------------------------------
// PackageCodec
// ---------------------------------------------------------------------------

/// Reads and writes `.pxa` packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageCodec;

impl PackageCodec {
    /// Serialize `metadata` and `data` into package bytes.
    pub fn to_bytes(metadata: &AssetMetadata, data: &[u8]) -> Result<Vec<u8>, PackageError> {
        let section = encode_section(&MetadataSection {
            name: metadata.name.clone(),
            source_file: metadata.source_file.clone(),
            version: metadata.version,
            payload_hash: payload_hash(data),
        })?;
        let header = PackageHeader {
            version: PACKAGE_VERSION,
            asset_type: metadata.asset_type,
            uuid: metadata.uuid,
            metadata_size: section.len() as u64,
            data_size: data.len() as u64,
            import_timestamp: metadata.import_timestamp,
            source_timestamp: metadata.source_timestamp,
        };

        let mut out = Vec::with_capacity(HEADER_SIZE + section.len() + data.len());
        header
            .write(&mut out)
            .map_err(|e| PackageError::Metadata(format!("header: {e}")))?;
        out.extend_from_slice(&section);
        out.extend_from_slice(data);
        Ok(out)
    }

    /// Write a package to `path`, creating parent directories as needed.
    pub fn save_to_file(
        path: &Path,
        metadata: &AssetMetadata,
        data: &[u8],
    ) -> Result<(), PackageError> {
        let bytes = Self::to_bytes(metadata, data)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PackageError::io(parent, e))?;
        }
        fs::write(path, bytes).map_err(|e| PackageError::io(path, e))?;
        tracing::debug!(
            path = %path.display(),
            uuid = %metadata.uuid,
            bytes = data.len(),
            "wrote package"
        );
        Ok(())
    }

    /// Read and fully validate a package file.
    pub fn load_from_file(path: &Path) -> Result<(AssetMetadata, Vec<u8>), PackageError> {
        let bytes = fs::read(path).map_err(|e| PackageError::io(path, e))?;
        Self::load_from_memory(&bytes)
    }

    /// Same contract as [`load_from_file`](Self::load_from_file), over an
    /// in-memory buffer.
    pub fn load_from_memory(bytes: &[u8]) -> Result<(AssetMetadata, Vec<u8>), PackageError> {
        let header = PackageHeader::parse(bytes)?;
        let total = header.total_len().ok_or(PackageError::Truncated {
            needed: u64::MAX,
            available: bytes.len() as u64,
        })?;
        if (bytes.len() as u64) < total {
            return Err(PackageError::Truncated {
                needed: total,
                available: bytes.len() as u64,
            });
        }

        let meta_end = HEADER_SIZE + header.metadata_size as usize;
        let section = decode_section(&bytes[HEADER_SIZE..meta_end])?;
        let data = bytes[meta_end..total as usize].to_vec();

        let found = payload_hash(&data);
        if found != section.payload_hash {
            return Err(PackageError::HashMismatch {
                expected: section.payload_hash,
                found,
            });
        }

        Ok((assemble(&header, section), data))
    }

    /// Read only the header and metadata section of a package file.
    ///
    /// The payload is neither read nor hashed.
    pub fn load_metadata_only(path: &Path) -> Result<AssetMetadata, PackageError> {
        let mut file = File::open(path).map_err(|e| PackageError::io(path, e))?;
        let file_len = file
            .metadata()
            .map_err(|e| PackageError::io(path, e))?
            .len();

        let mut head = [0u8; HEADER_SIZE];
        let available = file_len.min(HEADER_SIZE as u64) as usize;
        file.read_exact(&mut head[..available])
            .map_err(|e| PackageError::io(path, e))?;
        let header = PackageHeader::parse(&head[..available])?;

        let needed = (HEADER_SIZE as u64).saturating_add(header.metadata_size);
        if file_len < needed {
            return Err(PackageError::Truncated {
                needed,
                available: file_len,
            });
        }
        let mut section = vec![0u8; header.metadata_size as usize];
        file.read_exact(&mut section)
            .map_err(|e| PackageError::io(path, e))?;
        Ok(assemble(&header, decode_section(&section)?))
    }

    /// Header and metadata of an in-memory package, without hashing the
    /// payload.
    pub fn load_metadata_from_memory(bytes: &[u8]) -> Result<AssetMetadata, PackageError> {
        let header = PackageHeader::parse(bytes)?;
        let needed = (HEADER_SIZE as u64).saturating_add(header.metadata_size);
        if (bytes.len() as u64) < needed {
            return Err(PackageError::Truncated {
                needed,
                available: bytes.len() as u64,
            });
        }
        let section = decode_section(&bytes[HEADER_SIZE..needed as usize])?;
        Ok(assemble(&header, section))
    }

    /// Package path for a source file: same location, `pxa` extension.
    pub fn package_path_for(source: &Path) -> PathBuf {
        source.with_extension(PACKAGE_EXTENSION)
    }

    /// `true` when no package exists for `source` or the source was modified
    /// strictly after its package.
    pub fn needs_reimport(source: &Path) -> bool {
        let package = Self::package_path_for(source);
        let Some(package_ts) = modified_nanos(&package) else {
            return true;
        };
        match modified_nanos(source) {
            Some(source_ts) => source_ts > package_ts,
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
