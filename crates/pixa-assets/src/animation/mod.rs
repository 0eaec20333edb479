//! Passive animation assets: sprite sheets, clips and animator controllers.
//!
//! All three are stored in packages as JSON (camelCase fields) and loaded
//! through the asset registry. Each document leads with the asset's `name`
//! and `uuid`, followed by its own fields. Cross-references between them are
//! plain [`AssetUuid`](crate::uuid::AssetUuid)s resolved at use time.

mod clip;
mod controller;
mod sprite_sheet;

pub use clip::{AnimationClip, AnimationFrame, WrapMode, DEFAULT_FRAME_RATE};
pub use controller::{
    AnimationState, AnimatorController, AnimatorParameter, ComparisonType, ParameterType,
    ParameterValue, StateTransition, TransitionCondition,
};
pub use sprite_sheet::{SpriteFrame, SpriteSheet};

use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::metadata::AssetMetadata;
use crate::uuid::AssetUuid;

#[derive(Serialize)]
struct DocumentRef<'a, T> {
    name: &'a str,
    uuid: AssetUuid,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Deserialize)]
struct Document<T> {
    #[serde(default)]
    name: String,
    #[serde(default)]
    uuid: AssetUuid,
    #[serde(flatten)]
    body: T,
}

/// Parse an asset document. The embedded identity fills whatever `metadata`
/// does not already carry; package metadata wins when both are present.
fn parse_json<T: serde::de::DeserializeOwned>(
    what: &'static str,
    data: &[u8],
    metadata: &mut AssetMetadata,
) -> Result<T, AssetError> {
    let doc: Document<T> = serde_json::from_slice(data).map_err(|e| AssetError::parse(what, e))?;
    if metadata.name.is_empty() {
        metadata.name = doc.name;
    }
    if metadata.uuid.is_none() {
        metadata.uuid = doc.uuid;
    }
    Ok(doc.body)
}

fn to_json<T: Serialize>(
    what: &'static str,
    metadata: &AssetMetadata,
    body: &T,
) -> Result<String, AssetError> {
    let doc = DocumentRef {
        name: &metadata.name,
        uuid: metadata.uuid,
        body,
    };
    serde_json::to_string_pretty(&doc).map_err(|e| AssetError::parse(what, e))
}
