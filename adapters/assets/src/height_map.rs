use std::{fs, path::Path};

use monolake_core::HeightField;

use crate::AssetError;

/// Decodes an encoded image into a height field, tapping the red channel.
///
/// Grayscale images expand to equal RGB channels, so the red channel carries
/// the intensity for both grayscale and colour-encoded height maps.
pub fn decode_height_field(bytes: &[u8], displacement_scale: f32) -> Result<HeightField, AssetError> {
    let image = image::load_from_memory(bytes)?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let intensities = rgba.pixels().map(|pixel| pixel.0[0]).collect();
    Ok(HeightField::from_intensities(
        width,
        height,
        intensities,
        displacement_scale,
    )?)
}

/// Reads and decodes the height image stored at `path`.
pub fn load_height_field(
    path: impl AsRef<Path>,
    displacement_scale: f32,
) -> Result<HeightField, AssetError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_height_field(&bytes, displacement_scale)
}
