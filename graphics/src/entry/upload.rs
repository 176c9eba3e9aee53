//! Upload scheduling onto the render thread.

use std::sync::Arc;

use silkweed_core::worker_queue::WorkerQueue;

use crate::backend::RenderDevice;

use super::{
    EntryState, MaterialEntry, MeshEntry, RenderTargetEntry, ShaderEntry, TextureEntry,
};

/// Queue of device actions drained by the render thread each frame.
///
/// The context is the render device itself, so actions run with direct
/// device access but only ever on the thread that owns it.
pub type UploadQueue = WorkerQueue<dyn RenderDevice>;

/// Type-erased entry reference for the upload path.
#[derive(Clone)]
pub enum AnyEntry {
    Texture(Arc<TextureEntry>),
    Mesh(Arc<MeshEntry>),
    Shader(Arc<ShaderEntry>),
    Material(Arc<MaterialEntry>),
    RenderTarget(Arc<RenderTargetEntry>),
}

impl AnyEntry {
    /// Lifecycle bookkeeping of the wrapped entry.
    pub fn core(&self) -> &super::EntryCore {
        match self {
            Self::Texture(entry) => entry.core(),
            Self::Mesh(entry) => entry.core(),
            Self::Shader(entry) => entry.core(),
            Self::Material(entry) => entry.core(),
            Self::RenderTarget(entry) => entry.core(),
        }
    }

    fn upload(&self, device: &mut dyn RenderDevice) {
        match self {
            Self::Texture(entry) => entry.upload(device),
            Self::Mesh(entry) => entry.upload(device),
            Self::Shader(entry) => entry.upload(device),
            Self::Material(entry) => entry.upload(device),
            Self::RenderTarget(entry) => entry.upload(device),
        }
    }
}

/// Move an entry into `Uploading` and enqueue its device work.
///
/// The transition gates the enqueue: whichever caller wins the
/// compare-and-swap schedules exactly one upload action, so repeated
/// requests for the same outdated entry do not pile up. Returns whether
/// this call did the scheduling.
pub fn request_upload(queue: &UploadQueue, entry: AnyEntry) -> bool {
    let state = entry.core().state();
    let scheduled = match state {
        EntryState::Created | EntryState::Loading | EntryState::Outdated => {
            entry.core().try_transition(state, EntryState::Uploading)
        }
        EntryState::Uploading | EntryState::Using => false,
    };
    if scheduled {
        queue.push(move |device: &mut (dyn RenderDevice + 'static)| entry.upload(device));
    }
    scheduled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DummyDevice, RenderDevice};
    use crate::types::CpuTexture;
    use std::time::Duration;

    #[test]
    fn request_upload_schedules_once() {
        let queue = UploadQueue::new("upload");
        let entry = Arc::new(TextureEntry::from_cpu(CpuTexture::solid([1, 1, 1, 255])));

        assert!(request_upload(&queue, AnyEntry::Texture(Arc::clone(&entry))));
        // Already uploading, so a second request is a no-op.
        assert!(!request_upload(&queue, AnyEntry::Texture(Arc::clone(&entry))));
        assert_eq!(queue.len(), 1);

        let mut device = DummyDevice::new();
        queue.run_for(&mut device as &mut dyn RenderDevice, Duration::from_secs(1));
        assert!(entry.handle().is_some());
        assert_eq!(entry.core().state(), EntryState::Using);
    }

    #[test]
    fn concurrent_requests_have_one_winner() {
        let queue = Arc::new(UploadQueue::new("upload"));
        let entry = Arc::new(TextureEntry::from_cpu(CpuTexture::solid([2, 2, 2, 255])));

        let scheduled: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let queue = Arc::clone(&queue);
                    let entry = Arc::clone(&entry);
                    scope.spawn(move || request_upload(&queue, AnyEntry::Texture(entry)))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or(false))
                .filter(|&won| won)
                .count()
        });

        assert_eq!(scheduled, 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn usable_entries_are_not_rescheduled() {
        let queue = UploadQueue::new("upload");
        let entry = Arc::new(TextureEntry::from_cpu(CpuTexture::solid([3, 3, 3, 255])));
        request_upload(&queue, AnyEntry::Texture(Arc::clone(&entry)));

        let mut device = DummyDevice::new();
        queue.run_for(&mut device as &mut dyn RenderDevice, Duration::from_secs(1));

        assert!(!request_upload(&queue, AnyEntry::Texture(Arc::clone(&entry))));
        assert!(queue.is_empty());
    }
}
