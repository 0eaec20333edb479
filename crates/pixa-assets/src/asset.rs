//! The [`Asset`] capability trait, its factory, and the non-animation asset
//! kinds (textures, audio clips, scenes).
//!
//! Loaded assets are shared as `Arc<dyn Asset>`; typed access goes through
//! [`downcast_asset`].

use std::any::Any;
use std::io::Cursor;
use std::sync::Arc;

use crate::animation::{AnimationClip, AnimatorController, SpriteSheet};
use crate::error::AssetError;
use crate::metadata::{AssetMetadata, AssetType};
use crate::uuid::AssetUuid;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Upcasting helpers so `dyn Asset` can be downcast to its concrete type.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Common surface of every loadable asset.
pub trait Asset: AsAny {
    fn asset_type(&self) -> AssetType;

    fn metadata(&self) -> &AssetMetadata;

    fn set_metadata(&mut self, metadata: AssetMetadata);

    /// Decode a package payload into the in-memory form.
    fn load(&mut self, data: &[u8]) -> Result<(), AssetError>;

    /// Release decoded data. The metadata is kept.
    fn unload(&mut self);

    fn is_loaded(&self) -> bool;

    /// Approximate bytes held by the decoded data.
    fn memory_usage(&self) -> usize;

    fn uuid(&self) -> AssetUuid {
        self.metadata().uuid
    }

    fn name(&self) -> &str {
        &self.metadata().name
    }
}

impl std::fmt::Debug for dyn Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("uuid", &self.uuid())
            .field("type", &self.asset_type())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Build an empty asset of the given kind, ready for [`Asset::load`].
///
/// Returns `None` for [`AssetType::Unknown`].
pub fn create_asset(asset_type: AssetType) -> Option<Box<dyn Asset>> {
    let asset: Box<dyn Asset> = match asset_type {
        AssetType::Texture => Box::new(Texture::default()),
        AssetType::Audio => Box::new(AudioClip::default()),
        AssetType::Scene => Box::new(Scene::default()),
        AssetType::SpriteSheet => Box::new(SpriteSheet::default()),
        AssetType::AnimationClip => Box::new(AnimationClip::default()),
        AssetType::AnimatorController => Box::new(AnimatorController::default()),
        AssetType::Unknown => return None,
    };
    Some(asset)
}

/// Typed view of a shared asset, `None` if it is some other kind.
pub fn downcast_asset<T: Asset>(asset: Arc<dyn Asset>) -> Option<Arc<T>> {
    asset.into_any_arc().downcast::<T>().ok()
}

// ---------------------------------------------------------------------------
// Texture
// ---------------------------------------------------------------------------

/// Decoded RGBA8 image.
#[derive(Debug, Default)]
pub struct Texture {
    metadata: AssetMetadata,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    loaded: bool,
}

impl Texture {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGBA8 pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl Asset for Texture {
    fn asset_type(&self) -> AssetType {
        AssetType::Texture
    }

    fn metadata(&self) -> &AssetMetadata {
        &self.metadata
    }

    fn set_metadata(&mut self, metadata: AssetMetadata) {
        self.metadata = metadata;
    }

    fn load(&mut self, data: &[u8]) -> Result<(), AssetError> {
        let rgba = image::load_from_memory(data)
            .map_err(|e| AssetError::parse("texture", e))?
            .to_rgba8();
        self.width = rgba.width();
        self.height = rgba.height();
        self.pixels = rgba.into_raw();
        self.loaded = true;
        Ok(())
    }

    fn unload(&mut self) {
        self.pixels = Vec::new();
        self.width = 0;
        self.height = 0;
        self.loaded = false;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn memory_usage(&self) -> usize {
        self.pixels.len()
    }
}

// ---------------------------------------------------------------------------
// AudioClip
// ---------------------------------------------------------------------------

/// Encoded audio bytes plus the format description when the container is
/// WAV. Decoding to samples is the mixer's job.
#[derive(Debug, Default)]
pub struct AudioClip {
    metadata: AssetMetadata,
    data: Vec<u8>,
    format: Option<hound::WavSpec>,
    frames: u32,
    loaded: bool,
}

impl AudioClip {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.format.map(|f| f.sample_rate)
    }

    pub fn channels(&self) -> Option<u16> {
        self.format.map(|f| f.channels)
    }

    /// Length in seconds, known only for WAV payloads.
    pub fn duration_secs(&self) -> Option<f32> {
        let format = self.format?;
        (format.sample_rate > 0).then(|| self.frames as f32 / format.sample_rate as f32)
    }
}

impl Asset for AudioClip {
    fn asset_type(&self) -> AssetType {
        AssetType::Audio
    }

    fn metadata(&self) -> &AssetMetadata {
        &self.metadata
    }

    fn set_metadata(&mut self, metadata: AssetMetadata) {
        self.metadata = metadata;
    }

    fn load(&mut self, data: &[u8]) -> Result<(), AssetError> {
        if data.starts_with(b"RIFF") {
            let reader = hound::WavReader::new(Cursor::new(data))
                .map_err(|e| AssetError::parse("audio clip", e))?;
            self.format = Some(reader.spec());
            self.frames = reader.duration();
        } else {
            self.format = None;
            self.frames = 0;
        }
        self.data = data.to_vec();
        self.loaded = true;
        Ok(())
    }

    fn unload(&mut self) {
        self.data = Vec::new();
        self.format = None;
        self.frames = 0;
        self.loaded = false;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn memory_usage(&self) -> usize {
        self.data.len()
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A scene document. Its JSON is interpreted by the scene loader, not here.
#[derive(Debug, Default)]
pub struct Scene {
    metadata: AssetMetadata,
    document: serde_json::Value,
    source_len: usize,
    loaded: bool,
}

impl Scene {
    pub fn document(&self) -> &serde_json::Value {
        &self.document
    }
}

impl Asset for Scene {
    fn asset_type(&self) -> AssetType {
        AssetType::Scene
    }

    fn metadata(&self) -> &AssetMetadata {
        &self.metadata
    }

    fn set_metadata(&mut self, metadata: AssetMetadata) {
        self.metadata = metadata;
    }

    fn load(&mut self, data: &[u8]) -> Result<(), AssetError> {
        self.document = serde_json::from_slice(data).map_err(|e| AssetError::parse("scene", e))?;
        self.source_len = data.len();
        self.loaded = true;
        Ok(())
    }

    fn unload(&mut self) {
        self.document = serde_json::Value::Null;
        self.source_len = 0;
        self.loaded = false;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn memory_usage(&self) -> usize {
        self.source_len
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
