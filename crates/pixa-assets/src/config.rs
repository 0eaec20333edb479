//! Asset pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::importer::DEFAULT_UUID_CACHE_PATH;

/// Where assets live and how they are imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Root directory scanned for sources and packages.
    pub asset_root: PathBuf,
    /// Location of the path → UUID cache sidecar.
    pub uuid_cache_path: PathBuf,
    /// Descend into subdirectories on directory import.
    pub recursive_import: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("datas"),
            uuid_cache_path: PathBuf::from(DEFAULT_UUID_CACHE_PATH),
            recursive_import: true,
        }
    }
}

impl AssetConfig {
    /// Config rooted at `root`, with the UUID cache inside it.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let asset_root = root.into();
        Self {
            uuid_cache_path: asset_root.join(".asset_uuid_cache"),
            asset_root,
            recursive_import: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_datas() {
        let cfg = AssetConfig::default();
        assert_eq!(cfg.asset_root, PathBuf::from("datas"));
        assert_eq!(cfg.uuid_cache_path, PathBuf::from("datas/.asset_uuid_cache"));
        assert!(cfg.recursive_import);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: AssetConfig = serde_json::from_str(r#"{"recursive_import": false}"#).unwrap();
        assert!(!cfg.recursive_import);
        assert_eq!(cfg.asset_root, PathBuf::from("datas"));
    }
}
