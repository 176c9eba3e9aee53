//! Texture entries.

use parking_lot::Mutex;

use crate::backend::{RenderDevice, TextureHandle};
use crate::types::CpuTexture;

use super::{DoubleBuffered, EntryCore, EntryState};

/// A texture registered with the resource system.
///
/// Path-loaded textures start in `Created` with no data and get their
/// pixels from a loader thread; generated textures carry pixels from the
/// start. Either way the pixels wait in `pending` until the render thread
/// uploads them.
pub struct TextureEntry {
    core: EntryCore,
    pending: Mutex<Option<CpuTexture>>,
    handle: DoubleBuffered<TextureHandle>,
}

impl TextureEntry {
    /// Entry for a texture whose pixels arrive later from a loader.
    pub fn pending_load(label: impl Into<String>) -> Self {
        Self {
            core: EntryCore::new(label),
            pending: Mutex::new(None),
            handle: DoubleBuffered::new(),
        }
    }

    /// Entry for a texture with pixels already in hand.
    pub fn from_cpu(texture: CpuTexture) -> Self {
        let label = if texture.label().is_empty() {
            "unnamed texture".to_string()
        } else {
            texture.label().to_string()
        };
        Self {
            core: EntryCore::new(label),
            pending: Mutex::new(Some(texture)),
            handle: DoubleBuffered::new(),
        }
    }

    /// Lifecycle bookkeeping.
    pub fn core(&self) -> &EntryCore {
        &self.core
    }

    /// The live GPU handle.
    ///
    /// `None` until the first upload publishes one; after that the last
    /// published handle stays bindable while refreshes are in flight.
    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle.live()
    }

    /// Provide new pixels, marking any uploaded copy as outdated.
    pub fn set_pending(&self, texture: CpuTexture) {
        *self.pending.lock() = Some(texture);
        self.core.bump_generation();
        // If an upload is in flight the CAS loses; the generation check at
        // the end of that upload picks the change up instead.
        self.core
            .try_transition(EntryState::Using, EntryState::Outdated);
    }

    /// Create the GPU texture from the pending pixels.
    ///
    /// Runs on the render thread with the entry in `Uploading`.
    pub fn upload(&self, device: &mut dyn RenderDevice) {
        let generation = self.core.generation();
        let Some(pixels) = self.pending.lock().take() else {
            // A newer upload already consumed the pixels.
            if self.handle.live().is_some() {
                self.core
                    .try_transition(EntryState::Uploading, EntryState::Using);
            } else {
                log::warn!(
                    "texture '{}' scheduled for upload with no pixels",
                    self.core.label()
                );
                self.core.mark_failed();
            }
            return;
        };

        match device.create_texture(&pixels) {
            Ok(handle) => {
                for retired in self.handle.publish(handle) {
                    device.delete_texture(retired);
                }
                self.core.set_uploaded_generation(generation);
                self.core
                    .try_transition(EntryState::Uploading, EntryState::Using);
                if self.core.is_stale() {
                    // New pixels arrived mid-upload; mark for another pass.
                    self.core
                        .try_transition(EntryState::Using, EntryState::Outdated);
                }
                log::trace!("texture '{}' uploaded", self.core.label());
            }
            Err(err) => {
                self.core.mark_failed();
                log::warn!(
                    "texture '{}' upload failed: {err}; placeholder will be used",
                    self.core.label()
                );
            }
        }
    }

    /// Delete any live GPU handle. Render thread only.
    pub fn release(&self, device: &mut dyn RenderDevice) {
        for retired in [self.handle.live()].into_iter().flatten() {
            device.delete_texture(retired);
        }
    }
}

impl std::fmt::Debug for TextureEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureEntry").field("core", &self.core).finish()
    }
}
