#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Asset adapter that turns terrain images and avatar clip lists into world commands.
//!
//! Decoding happens on background threads. The frame loop polls the
//! [`AssetLoader`] without blocking and forwards whatever commands are ready;
//! until then the world keeps its spawn elevation and plays no clips.

mod clips;
mod height_map;
mod loader;

use std::{io, path::PathBuf};

use monolake_core::{AnimationClip, HeightFieldError};
use thiserror::Error;

pub use clips::{resolve_clips, ClipResolution};
pub use height_map::{decode_height_field, load_height_field};
pub use loader::AssetLoader;

/// Errors produced while acquiring assets.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The asset file could not be read.
    #[error("failed to read asset at {}", path.display())]
    Io {
        /// Location of the asset.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The image bytes could not be decoded.
    #[error("failed to decode height image")]
    Decode(#[from] image::ImageError),
    /// The decoded pixels did not form a valid height field.
    #[error("decoded height image is not a valid height field")]
    InvalidField(#[from] HeightFieldError),
    /// The avatar asset lacks clips the animation selector relies on.
    #[error("avatar asset is missing clips {missing:?}")]
    MissingClips {
        /// Clips that could not be resolved.
        missing: Vec<AnimationClip>,
    },
    /// A background loader thread could not be started.
    #[error("failed to spawn asset loader thread")]
    Spawn(#[source] io::Error),
}
