//! Pixa assets -- UUID-addressed asset pipeline for the Pixa engine.
//!
//! Source files (images, audio, scenes, animation JSON) are imported into
//! `.pxa` packages, each identified by a stable [`AssetUuid`](uuid::AssetUuid).
//! The [`AssetRegistry`](registry::AssetRegistry) resolves UUIDs and paths to
//! shared, decoded assets on demand.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use pixa_assets::prelude::*;
//!
//! let mut registry = AssetRegistry::new(AssetConfig::default());
//! registry.initialize()?;
//! if let Some(sheet) = registry.load_asset_from_path(Path::new("datas/hero.spritesheet")) {
//!     println!("{} uses {} bytes", sheet.name(), sheet.memory_usage());
//! }
//! registry.shutdown()?;
//! # Ok::<(), AssetError>(())
//! ```

#![deny(unsafe_code)]

pub mod animation;
pub mod asset;
pub mod bundle;
pub mod config;
pub mod encode;
pub mod error;
pub mod importer;
pub mod math;
pub mod metadata;
pub mod package;
pub mod registry;
pub mod uuid;

pub use error::{AssetError, PackageError};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::animation::{
        AnimationClip, AnimationFrame, AnimationState, AnimatorController, AnimatorParameter,
        ComparisonType, ParameterType, ParameterValue, SpriteFrame, SpriteSheet,
        StateTransition, TransitionCondition, WrapMode,
    };
    pub use crate::asset::{create_asset, downcast_asset, Asset, AudioClip, Scene, Texture};
    pub use crate::bundle::{BundleWriter, GameBundle};
    pub use crate::config::AssetConfig;
    pub use crate::error::{AssetError, PackageError};
    pub use crate::importer::{detect_asset_type, AssetImporter, ImportStatus, ImportedAsset};
    pub use crate::math::{Rect, Vec2};
    pub use crate::metadata::{AssetMetadata, AssetType};
    pub use crate::package::PackageCodec;
    pub use crate::registry::AssetRegistry;
    pub use crate::uuid::AssetUuid;
}
