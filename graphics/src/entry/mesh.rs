//! Mesh entries.

use parking_lot::Mutex;

use crate::backend::{MeshHandle, RenderDevice};
use crate::types::CpuMesh;

use super::{DoubleBuffered, EntryCore, EntryState};

/// A mesh registered with the resource system.
///
/// Mirrors [`TextureEntry`](super::TextureEntry): CPU geometry waits in
/// `pending` until the render thread turns it into buffers and a vertex
/// array.
pub struct MeshEntry {
    core: EntryCore,
    pending: Mutex<Option<CpuMesh>>,
    handle: DoubleBuffered<MeshHandle>,
}

impl MeshEntry {
    /// Entry for a mesh with geometry already in hand.
    pub fn from_cpu(mesh: CpuMesh) -> Self {
        let label = if mesh.label().is_empty() {
            "unnamed mesh".to_string()
        } else {
            mesh.label().to_string()
        };
        Self {
            core: EntryCore::new(label),
            pending: Mutex::new(Some(mesh)),
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
    /// published handle stays drawable while refreshes are in flight.
    pub fn handle(&self) -> Option<MeshHandle> {
        self.handle.live()
    }

    /// Provide new geometry, marking any uploaded copy as outdated.
    pub fn set_pending(&self, mesh: CpuMesh) {
        *self.pending.lock() = Some(mesh);
        self.core.bump_generation();
        self.core
            .try_transition(EntryState::Using, EntryState::Outdated);
    }

    /// Create the GPU mesh from the pending geometry.
    ///
    /// Runs on the render thread with the entry in `Uploading`.
    pub fn upload(&self, device: &mut dyn RenderDevice) {
        let generation = self.core.generation();
        let Some(mesh) = self.pending.lock().take() else {
            if self.handle.live().is_some() {
                self.core
                    .try_transition(EntryState::Uploading, EntryState::Using);
            } else {
                log::warn!(
                    "mesh '{}' scheduled for upload with no geometry",
                    self.core.label()
                );
                self.core.mark_failed();
            }
            return;
        };

        match device.create_mesh(&mesh) {
            Ok(handle) => {
                for retired in self.handle.publish(handle) {
                    device.delete_mesh(retired);
                }
                self.core.set_uploaded_generation(generation);
                self.core
                    .try_transition(EntryState::Uploading, EntryState::Using);
                if self.core.is_stale() {
                    self.core
                        .try_transition(EntryState::Using, EntryState::Outdated);
                }
                log::trace!("mesh '{}' uploaded", self.core.label());
            }
            Err(err) => {
                self.core.mark_failed();
                log::warn!("mesh '{}' upload failed: {err}", self.core.label());
            }
        }
    }

    /// Delete any live GPU handle. Render thread only.
    pub fn release(&self, device: &mut dyn RenderDevice) {
        for retired in [self.handle.live()].into_iter().flatten() {
            device.delete_mesh(retired);
        }
    }
}

impl std::fmt::Debug for MeshEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshEntry").field("core", &self.core).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyDevice;
    use crate::types::generate_quad;

    #[test]
    fn upload_carries_index_count() {
        let entry = MeshEntry::from_cpu(generate_quad(1.0, 1.0));
        let mut device = DummyDevice::new();

        assert!(entry
            .core()
            .try_transition(EntryState::Created, EntryState::Uploading));
        entry.upload(&mut device);

        let handle = entry.handle().unwrap();
        assert_eq!(handle.index_count, 6);
        assert_eq!(entry.core().state(), EntryState::Using);
    }
}
