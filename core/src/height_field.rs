//! Immutable terrain height samples decoded from a grayscale image.

use thiserror::Error;

use crate::{WORLD_EXTENT, WORLD_HALF_EXTENT};

/// Row-major grid of intensity samples that places the avatar on the terrain.
///
/// The field mirrors the displacement the terrain mesh applies to its own
/// vertices: an intensity of 255 lifts the surface by `displacement_scale`
/// world units.
#[derive(Clone, PartialEq)]
pub struct HeightField {
    width: u32,
    height: u32,
    intensities: Vec<u8>,
    displacement_scale: f32,
}

impl HeightField {
    /// Builds a height field from a row-major intensity buffer.
    pub fn from_intensities(
        width: u32,
        height: u32,
        intensities: Vec<u8>,
        displacement_scale: f32,
    ) -> Result<Self, HeightFieldError> {
        if width == 0 || height == 0 {
            return Err(HeightFieldError::EmptyDimensions { width, height });
        }

        let expected = u64::from(width) * u64::from(height);
        if intensities.len() as u64 != expected {
            return Err(HeightFieldError::BufferLengthMismatch {
                expected,
                actual: intensities.len(),
            });
        }

        if !displacement_scale.is_finite() || displacement_scale <= 0.0 {
            return Err(HeightFieldError::InvalidDisplacementScale {
                scale: displacement_scale,
            });
        }

        Ok(Self {
            width,
            height,
            intensities,
            displacement_scale,
        })
    }

    /// Number of samples along the horizontal image axis.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of samples along the vertical image axis.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Elevation in world units produced by a full-intensity sample.
    #[must_use]
    pub const fn displacement_scale(&self) -> f32 {
        self.displacement_scale
    }

    /// Raw intensity stored at the provided pixel, if it lies inside the grid.
    #[must_use]
    pub fn intensity(&self, px: u32, py: u32) -> Option<u8> {
        if px >= self.width || py >= self.height {
            return None;
        }
        let index = py as usize * self.width as usize + px as usize;
        self.intensities.get(index).copied()
    }

    /// Samples the elevation at normalised planar coordinates.
    ///
    /// Coordinates are clamped into `0.0..=1.0` before being mapped onto the
    /// pixel grid, so rounding at the exact world boundary never escapes the
    /// buffer. Returns `None` for non-finite coordinates; callers keep their
    /// previous elevation in that case.
    #[must_use]
    pub fn sample(&self, u: f32, v: f32) -> Option<f32> {
        if !u.is_finite() || !v.is_finite() {
            return None;
        }

        let px = pixel_index(u, self.width);
        let py = pixel_index(v, self.height);
        let intensity = self.intensity(px, py)?;
        Some(f32::from(intensity) / 255.0 * self.displacement_scale)
    }

    /// Samples the elevation beneath a world-space planar coordinate.
    #[must_use]
    pub fn sample_world(&self, x: f32, z: f32) -> Option<f32> {
        let (u, v) = normalised_coordinates(x, z);
        self.sample(u, v)
    }
}

impl std::fmt::Debug for HeightField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeightField")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("displacement_scale", &self.displacement_scale)
            .finish_non_exhaustive()
    }
}

/// Maps a world-space planar coordinate onto the terrain's `0.0..=1.0` footprint.
#[must_use]
pub fn normalised_coordinates(x: f32, z: f32) -> (f32, f32) {
    (
        (x + WORLD_HALF_EXTENT) / WORLD_EXTENT,
        (z + WORLD_HALF_EXTENT) / WORLD_EXTENT,
    )
}

fn pixel_index(coordinate: f32, samples: u32) -> u32 {
    let last = samples.saturating_sub(1);
    let scaled = (coordinate.clamp(0.0, 1.0) * last as f32).floor();
    (scaled as u32).min(last)
}

/// Errors that can occur when constructing a [`HeightField`].
#[derive(Debug, Error, PartialEq)]
pub enum HeightFieldError {
    /// The source image had no pixels along at least one axis.
    #[error("height field dimensions must be positive (received {width}x{height})")]
    EmptyDimensions {
        /// Provided width.
        width: u32,
        /// Provided height.
        height: u32,
    },
    /// The intensity buffer did not contain one sample per pixel.
    #[error("height field expected {expected} samples but received {actual}")]
    BufferLengthMismatch {
        /// Number of samples implied by the dimensions.
        expected: u64,
        /// Number of samples supplied.
        actual: usize,
    },
    /// The displacement scale was zero, negative, or not finite.
    #[error("displacement scale must be a positive finite number (received {scale})")]
    InvalidDisplacementScale {
        /// Provided scale.
        scale: f32,
    },
}
