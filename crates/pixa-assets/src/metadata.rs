//! Asset type tags and per-asset metadata.

use std::fmt;
use std::path::{Component, Path};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::uuid::AssetUuid;

// ---------------------------------------------------------------------------
// AssetType
// ---------------------------------------------------------------------------

/// Closed set of asset kinds. The discriminant is the 16-bit code stored in
/// package headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum AssetType {
    #[default]
    Unknown = 0,
    Texture = 1,
    Audio = 2,
    Scene = 3,
    SpriteSheet = 4,
    AnimationClip = 5,
    AnimatorController = 6,
}

impl AssetType {
    pub const ALL: [AssetType; 7] = [
        AssetType::Unknown,
        AssetType::Texture,
        AssetType::Audio,
        AssetType::Scene,
        AssetType::SpriteSheet,
        AssetType::AnimationClip,
        AssetType::AnimatorController,
    ];

    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Decode a header code. Unrecognized codes map to `Unknown`.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => AssetType::Texture,
            2 => AssetType::Audio,
            3 => AssetType::Scene,
            4 => AssetType::SpriteSheet,
            5 => AssetType::AnimationClip,
            6 => AssetType::AnimatorController,
            _ => AssetType::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AssetType::Unknown => "unknown",
            AssetType::Texture => "texture",
            AssetType::Audio => "audio",
            AssetType::Scene => "scene",
            AssetType::SpriteSheet => "sprite sheet",
            AssetType::AnimationClip => "animation clip",
            AssetType::AnimatorController => "animator controller",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// AssetMetadata
// ---------------------------------------------------------------------------

/// Current metadata revision written by the importer.
pub const METADATA_VERSION: u32 = 1;

/// Identity and provenance of one imported asset.
///
/// Timestamps are nanoseconds since the UNIX epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMetadata {
    pub uuid: AssetUuid,
    pub asset_type: AssetType,
    pub name: String,
    /// Source path, forward slashes.
    pub source_file: String,
    pub import_timestamp: u64,
    pub source_timestamp: u64,
    pub version: u32,
}

impl AssetMetadata {
    /// `true` when the source on disk is strictly newer than the one this
    /// metadata was imported from.
    pub fn needs_reimport(&self, on_disk_source_timestamp: u64) -> bool {
        on_disk_source_timestamp > self.source_timestamp
    }
}

// ---------------------------------------------------------------------------
// Path and time helpers
// ---------------------------------------------------------------------------

/// Forward-slash form of `path` with `.` components removed. Used as the key
/// of every path-indexed map.
pub fn normalize_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        let part = match component {
            Component::CurDir => continue,
            Component::RootDir => {
                out.push('/');
                continue;
            }
            Component::Prefix(prefix) => prefix.as_os_str().to_string_lossy(),
            Component::ParentDir => "..".into(),
            Component::Normal(s) => s.to_string_lossy(),
        };
        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(&part);
    }
    out
}

pub fn system_time_to_nanos(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

pub fn now_nanos() -> u64 {
    system_time_to_nanos(SystemTime::now())
}

/// Modification time of `path`, or `None` if it cannot be read.
pub fn modified_nanos(path: &Path) -> Option<u64> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(system_time_to_nanos(modified))
}
