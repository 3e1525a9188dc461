use std::{
    path::PathBuf,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
};

use monolake_core::{AssetKind, Command};
use tracing::{info, warn};

use crate::{clips::resolve_clips, height_map::load_height_field, AssetError};

/// Background asset acquisition with non-blocking, once-per-asset delivery.
///
/// Every requested asset produces exactly one batch of commands: either the
/// install command carrying the decoded asset or a report that the asset is
/// unavailable.
#[derive(Debug)]
pub struct AssetLoader {
    sender: Sender<Vec<Command>>,
    receiver: Receiver<Vec<Command>>,
    pending: usize,
}

impl AssetLoader {
    /// Creates a loader with no requests in flight.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            pending: 0,
        }
    }

    /// Number of requested assets that have not been delivered yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Decodes the height image at `path` on a background thread.
    pub fn request_height_field(
        &mut self,
        path: PathBuf,
        displacement_scale: f32,
    ) -> Result<(), AssetError> {
        let sender = self.sender.clone();
        let _handle = thread::Builder::new()
            .name("height-field-loader".to_owned())
            .spawn(move || {
                let commands = match load_height_field(&path, displacement_scale) {
                    Ok(field) => {
                        info!(
                            path = %path.display(),
                            width = field.width(),
                            height = field.height(),
                            "height field decoded"
                        );
                        vec![Command::InstallHeightField { field }]
                    }
                    Err(error) => {
                        warn!(path = %path.display(), %error, "height field unavailable");
                        vec![Command::ReportAssetUnavailable {
                            asset: AssetKind::HeightField,
                            reason: error_chain(&error),
                        }]
                    }
                };
                let _ = sender.send(commands);
            })
            .map_err(AssetError::Spawn)?;
        self.pending += 1;
        Ok(())
    }

    /// Resolves the clip names exported by the avatar asset on a background thread.
    pub fn request_animation_clips(&mut self, names: Vec<String>) -> Result<(), AssetError> {
        let sender = self.sender.clone();
        let _handle = thread::Builder::new()
            .name("animation-clip-loader".to_owned())
            .spawn(move || {
                let resolution = resolve_clips(names.iter().map(String::as_str));
                info!(
                    available = ?resolution.available,
                    missing = ?resolution.missing,
                    "animation clips resolved"
                );
                let _ = sender.send(resolution.into_commands());
            })
            .map_err(AssetError::Spawn)?;
        self.pending += 1;
        Ok(())
    }

    /// Moves every delivered command into `out` without blocking.
    pub fn poll(&mut self, out: &mut Vec<Command>) {
        loop {
            match self.receiver.try_recv() {
                Ok(commands) => {
                    self.pending = self.pending.saturating_sub(1);
                    out.extend(commands);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn error_chain(error: &AssetError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
