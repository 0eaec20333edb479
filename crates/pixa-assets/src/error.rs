//! Error types for the package codec and the asset pipeline.

use std::path::PathBuf;

use crate::metadata::AssetType;
use crate::uuid::AssetUuid;

/// Errors produced while reading or writing `.pxa` packages and bundles.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The first four bytes are not the expected magic.
    #[error("bad magic {found:02x?}, expected {expected:02x?}")]
    BadMagic { found: [u8; 4], expected: [u8; 4] },

    /// Written by a newer format revision than this build understands.
    #[error("format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Fewer bytes than the header promised.
    #[error("truncated data: needed {needed} bytes, only {available} available")]
    Truncated { needed: u64, available: u64 },

    #[error("package metadata could not be decoded: {0}")]
    Metadata(String),

    #[error("payload hash mismatch (expected {expected}, found {found})")]
    HashMismatch { expected: String, found: String },
}

impl PackageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors produced by importing, decoding and resolving assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("no importer for {}", .0.display())]
    UnknownType(PathBuf),

    #[error("failed to encode {}: {reason}", path.display())]
    Encode { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Payload bytes could not be parsed into the asset's in-memory form.
    #[error("failed to parse {what}: {reason}")]
    Parse { what: &'static str, reason: String },

    #[error("expected a {expected} asset, found {found}")]
    TypeMismatch { expected: AssetType, found: AssetType },

    #[error("asset {0} is not registered")]
    NotRegistered(AssetUuid),

    #[error(transparent)]
    Package(#[from] PackageError),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(what: &'static str, reason: impl ToString) -> Self {
        Self::Parse {
            what,
            reason: reason.to_string(),
        }
    }
}
