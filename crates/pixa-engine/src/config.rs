//! Engine configuration, loadable from a JSON file.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! {
//!     "tick": { "fixed_dt": 0.02 },
//!     "assets": { "asset_root": "game/datas" },
//!     "log_filter": "pixa_assets=debug,warn"
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use pixa_assets::config::AssetConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
///
/// The `fixed_dt` is the duration in seconds of each simulation tick. A value
/// of `1.0 / 60.0` gives 60 ticks per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz (1/60 second per tick).
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
        }
    }
}

impl TickConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.fixed_dt > 0.0 && self.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            self.fixed_dt
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick: TickConfig,
    pub assets: AssetConfig,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick: TickConfig::default(),
            assets: AssetConfig::default(),
            log_filter: "warn".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid engine config")?;
        config.tick.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn partial_document_overrides_only_named_keys() {
        let config = EngineConfig::from_json_str(
            r#"{"log_filter": "debug", "assets": {"recursive_import": false}}"#,
        )
        .unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.tick.fixed_dt, 1.0 / 60.0);
        assert!(!config.assets.recursive_import);
        assert_eq!(config.assets.asset_root, std::path::PathBuf::from("datas"));
    }

    #[test]
    fn non_positive_dt_is_rejected() {
        assert!(EngineConfig::from_json_str(r#"{"tick": {"fixed_dt": 0.0}}"#).is_err());
        assert!(EngineConfig::from_json_str(r#"{"tick": {"fixed_dt": -1.0}}"#).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EngineConfig::from_file(Path::new("/nonexistent/pixa.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/pixa.json"));
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        let mut config = EngineConfig::default();
        config.tick.fixed_dt = 0.02;
        config.log_filter = "debug".into();
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(EngineConfig::from_file(&path).unwrap(), config);
    }
}
