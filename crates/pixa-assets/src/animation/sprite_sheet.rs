use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::error::AssetError;
use crate::math::{Rect, Vec2};
use crate::metadata::{AssetMetadata, AssetType};
use crate::uuid::AssetUuid;

fn centre_pivot() -> Vec2 {
    Vec2::splat(0.5)
}

/// One named rectangle of a sprite sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteFrame {
    #[serde(default)]
    pub name: String,
    pub rect: Rect,
    /// Normalized (0..1) pivot inside `rect`.
    #[serde(default = "centre_pivot")]
    pub pivot: Vec2,
}

/// Frame rectangles cut from one texture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpriteSheet {
    #[serde(skip)]
    metadata: AssetMetadata,
    #[serde(skip)]
    loaded: bool,
    pub texture_uuid: AssetUuid,
    pub frames: Vec<SpriteFrame>,
    /// Editor grid, not used at runtime.
    pub grid_columns: u32,
    pub grid_rows: u32,
}

impl Default for SpriteSheet {
    fn default() -> Self {
        Self {
            metadata: AssetMetadata::default(),
            loaded: false,
            texture_uuid: AssetUuid::NONE,
            frames: Vec::new(),
            grid_columns: 1,
            grid_rows: 1,
        }
    }
}

impl SpriteSheet {
    pub fn new(texture_uuid: AssetUuid) -> Self {
        Self {
            texture_uuid,
            ..Self::default()
        }
    }

    pub fn frame(&self, index: usize) -> Option<&SpriteFrame> {
        self.frames.get(index)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Append a frame and return its index.
    pub fn add_frame(&mut self, name: impl Into<String>, rect: Rect, pivot: Vec2) -> usize {
        self.frames.push(SpriteFrame {
            name: name.into(),
            rect,
            pivot,
        });
        self.frames.len() - 1
    }

    /// Replace the frame list with a `columns × rows` grid over a texture of
    /// the given size. Frames are row-major with centred pivots.
    pub fn slice_grid(&mut self, texture_width: u32, texture_height: u32, columns: u32, rows: u32) {
        self.grid_columns = columns;
        self.grid_rows = rows;
        self.frames.clear();
        if columns == 0 || rows == 0 {
            return;
        }

        let cell_w = (texture_width / columns) as f32;
        let cell_h = (texture_height / rows) as f32;
        for row in 0..rows {
            for col in 0..columns {
                let index = self.frames.len();
                self.frames.push(SpriteFrame {
                    name: format!("frame_{index}"),
                    rect: Rect::new(col as f32 * cell_w, row as f32 * cell_h, cell_w, cell_h),
                    pivot: centre_pivot(),
                });
            }
        }
    }

    pub fn to_json(&self) -> Result<String, AssetError> {
        super::to_json("sprite sheet", &self.metadata, self)
    }
}

impl Asset for SpriteSheet {
    fn asset_type(&self) -> AssetType {
        AssetType::SpriteSheet
    }

    fn metadata(&self) -> &AssetMetadata {
        &self.metadata
    }

    fn set_metadata(&mut self, metadata: AssetMetadata) {
        self.metadata = metadata;
    }

    fn load(&mut self, data: &[u8]) -> Result<(), AssetError> {
        let parsed: SpriteSheet =
            super::parse_json("sprite sheet", data, &mut self.metadata)?;
        self.texture_uuid = parsed.texture_uuid;
        self.frames = parsed.frames;
        self.grid_columns = parsed.grid_columns;
        self.grid_rows = parsed.grid_rows;
        self.loaded = true;
        Ok(())
    }

    fn unload(&mut self) {
        self.frames = Vec::new();
        self.loaded = false;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn memory_usage(&self) -> usize {
        self.frames
            .iter()
            .map(|f| std::mem::size_of::<SpriteFrame>() + f.name.len())
            .sum()
    }
}
