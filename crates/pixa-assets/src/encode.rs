//! Source file → canonical payload encoders, one per asset type.

use std::io::Cursor;
use std::path::Path;

use crate::animation::{AnimationClip, AnimatorController, SpriteSheet};
use crate::error::AssetError;
use crate::metadata::AssetType;

/// Turn raw source bytes into the payload stored in the package.
///
/// - textures are decoded and re-encoded as PNG
/// - WAV audio is rewritten as canonical 16-bit PCM or 32-bit float WAV;
///   other audio containers are stored unchanged
/// - scenes must be valid JSON and are stored unchanged
/// - animation assets must parse into their typed model and are stored as the
///   original JSON text
pub fn encode_source(
    asset_type: AssetType,
    path: &Path,
    source: &[u8],
) -> Result<Vec<u8>, AssetError> {
    let fail = |reason: String| AssetError::Encode {
        path: path.to_path_buf(),
        reason,
    };
    match asset_type {
        AssetType::Texture => encode_texture(source).map_err(fail),
        AssetType::Audio => {
            if has_extension(path, "wav") {
                encode_wav(source).map_err(fail)
            } else {
                Ok(source.to_vec())
            }
        }
        AssetType::Scene => {
            serde_json::from_slice::<serde_json::Value>(source)
                .map_err(|e| fail(format!("scene is not valid JSON: {e}")))?;
            Ok(source.to_vec())
        }
        AssetType::SpriteSheet => validate_json::<SpriteSheet>(source).map_err(fail),
        AssetType::AnimationClip => validate_json::<AnimationClip>(source).map_err(fail),
        AssetType::AnimatorController => {
            validate_json::<AnimatorController>(source).map_err(fail)
        }
        AssetType::Unknown => Err(AssetError::UnknownType(path.to_path_buf())),
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn validate_json<T: serde::de::DeserializeOwned>(source: &[u8]) -> Result<Vec<u8>, String> {
    serde_json::from_slice::<T>(source).map_err(|e| e.to_string())?;
    Ok(source.to_vec())
}

fn encode_texture(source: &[u8]) -> Result<Vec<u8>, String> {
    let image = image::load_from_memory(source).map_err(|e| e.to_string())?;
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(out.into_inner())
}

fn encode_wav(source: &[u8]) -> Result<Vec<u8>, String> {
    let reader = hound::WavReader::new(Cursor::new(source)).map_err(|e| e.to_string())?;
    let spec = reader.spec();
    let mut out = Cursor::new(Vec::new());

    match spec.sample_format {
        hound::SampleFormat::Int => {
            let target = hound::WavSpec {
                channels: spec.channels,
                sample_rate: spec.sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            let shift = i32::from(spec.bits_per_sample) - 16;
            let mut writer = hound::WavWriter::new(&mut out, target).map_err(|e| e.to_string())?;
            for sample in reader.into_samples::<i32>() {
                let sample = sample.map_err(|e| e.to_string())?;
                let scaled = if shift >= 0 {
                    sample >> shift
                } else {
                    sample << -shift
                };
                let clamped = scaled.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
                writer.write_sample(clamped).map_err(|e| e.to_string())?;
            }
            writer.finalize().map_err(|e| e.to_string())?;
        }
        hound::SampleFormat::Float => {
            let target = hound::WavSpec {
                channels: spec.channels,
                sample_rate: spec.sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            };
            let mut writer = hound::WavWriter::new(&mut out, target).map_err(|e| e.to_string())?;
            for sample in reader.into_samples::<f32>() {
                writer
                    .write_sample(sample.map_err(|e| e.to_string())?)
                    .map_err(|e| e.to_string())?;
            }
            writer.finalize().map_err(|e| e.to_string())?;
        }
    }

    Ok(out.into_inner())
}
