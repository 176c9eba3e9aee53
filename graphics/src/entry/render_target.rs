//! Offscreen render target entries.

use parking_lot::Mutex;

use crate::backend::{RenderDevice, RenderTargetHandle};
use crate::types::Extent2d;

use super::{DoubleBuffered, EntryCore, EntryState};

/// An offscreen render target registered with the resource system.
///
/// The "source data" of a render target is its extent: resizing bumps the
/// generation and outdates the GPU object, and the next upload pass
/// recreates the framebuffer at the new size while the old one stays
/// bindable.
pub struct RenderTargetEntry {
    core: EntryCore,
    extent: Mutex<Extent2d>,
    handle: DoubleBuffered<RenderTargetHandle>,
}

impl RenderTargetEntry {
    /// Entry for a target of the given size.
    pub fn new(label: impl Into<String>, extent: Extent2d) -> Self {
        Self {
            core: EntryCore::new(label),
            extent: Mutex::new(extent),
            handle: DoubleBuffered::new(),
        }
    }

    /// Lifecycle bookkeeping.
    pub fn core(&self) -> &EntryCore {
        &self.core
    }

    /// The live GPU handle.
    ///
    /// `None` until the first allocation publishes one; after that the
    /// last published target stays bindable while a resize is in flight.
    pub fn handle(&self) -> Option<RenderTargetHandle> {
        self.handle.live()
    }

    /// Requested dimensions.
    pub fn extent(&self) -> Extent2d {
        *self.extent.lock()
    }

    /// Request a different size. No-op if the size is unchanged.
    pub fn request_resize(&self, extent: Extent2d) {
        {
            let mut current = self.extent.lock();
            if *current == extent {
                return;
            }
            *current = extent;
        }
        self.core.bump_generation();
        self.core
            .try_transition(EntryState::Using, EntryState::Outdated);
    }

    /// Create the framebuffer at the current extent.
    ///
    /// Runs on the render thread with the entry in `Uploading`.
    pub fn upload(&self, device: &mut dyn RenderDevice) {
        let generation = self.core.generation();
        let extent = self.extent();
        match device.create_render_target(extent) {
            Ok(handle) => {
                for retired in self.handle.publish(handle) {
                    device.delete_render_target(retired);
                }
                self.core.set_uploaded_generation(generation);
                self.core
                    .try_transition(EntryState::Uploading, EntryState::Using);
                if self.core.is_stale() {
                    self.core
                        .try_transition(EntryState::Using, EntryState::Outdated);
                }
                log::debug!(
                    "render target '{}' created at {}x{}",
                    self.core.label(),
                    extent.width,
                    extent.height
                );
            }
            Err(err) => {
                self.core.mark_failed();
                log::error!("render target '{}' failed: {err}", self.core.label());
            }
        }
    }

    /// Delete any live GPU handle. Render thread only.
    pub fn release(&self, device: &mut dyn RenderDevice) {
        for retired in [self.handle.live()].into_iter().flatten() {
            device.delete_render_target(retired);
        }
    }
}

impl std::fmt::Debug for RenderTargetEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTargetEntry")
            .field("core", &self.core)
            .field("extent", &self.extent())
            .finish()
    }
}
