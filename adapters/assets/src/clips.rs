use monolake_core::{AnimationClip, AssetKind, Command};

use crate::AssetError;

/// Outcome of resolving the clip names exported by the avatar asset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClipResolution {
    /// Clips found in the asset, in declaration order.
    pub available: Vec<AnimationClip>,
    /// Expected clips that the asset does not provide.
    pub missing: Vec<AnimationClip>,
}

impl ClipResolution {
    /// Converts the resolution into the commands the world expects.
    ///
    /// Available clips are always installed; a missing clip is additionally
    /// reported as an unavailable asset so presentation can explain why the
    /// avatar does not animate.
    #[must_use]
    pub fn into_commands(self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(2);
        if !self.missing.is_empty() {
            let error = AssetError::MissingClips {
                missing: self.missing,
            };
            commands.push(Command::ReportAssetUnavailable {
                asset: AssetKind::AnimationClips,
                reason: error.to_string(),
            });
        }
        commands.push(Command::InstallAnimationClips {
            clips: self.available,
        });
        commands
    }
}

/// Resolves exported clip names into the enumerated clips once, at load time.
pub fn resolve_clips<'a>(names: impl IntoIterator<Item = &'a str>) -> ClipResolution {
    let mut found = [false; AnimationClip::ALL.len()];
    for name in names {
        if let Some(clip) = AnimationClip::from_asset_name(name) {
            if let Some(index) = AnimationClip::ALL.iter().position(|known| *known == clip) {
                found[index] = true;
            }
        }
    }

    let mut resolution = ClipResolution::default();
    for (clip, present) in AnimationClip::ALL.into_iter().zip(found) {
        if present {
            resolution.available.push(clip);
        } else {
            resolution.missing.push(clip);
        }
    }
    resolution
}
