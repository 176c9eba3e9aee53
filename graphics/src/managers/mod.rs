//! Resource managers and the bundle that ties them together.

mod material;
mod mesh;
mod texture;

pub use material::{DEFAULT_MATERIAL, FORWARD_SHADER, MaterialManager};
pub use mesh::{BUILTIN_CUBE, BUILTIN_QUAD, BUILTIN_SPHERE, MeshFactory, MeshManager};
pub use texture::{TextureFactory, TextureManager};

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use silkweed_core::task_runner::TaskRunner;
use silkweed_vfs::{AssetSource, MemorySource};

use crate::backend::RenderDevice;
use crate::entry::{AnyEntry, EntryState, RenderTargetEntry, UploadQueue, request_upload};
use crate::light::LightManager;
use crate::types::Extent2d;

/// Every resource manager plus the upload queue, built once at startup
/// and shared by the logical thread, loader pool and render thread.
pub struct RenderResources {
    textures: TextureManager,
    meshes: MeshManager,
    materials: MaterialManager,
    lights: LightManager,
    upload_queue: Arc<UploadQueue>,
    render_targets: Mutex<Vec<Arc<RenderTargetEntry>>>,
}

impl RenderResources {
    /// Wire up the managers around an asset source and task pool.
    pub fn new(source: Arc<dyn AssetSource>, tasks: Arc<TaskRunner>) -> Self {
        let upload_queue = Arc::new(UploadQueue::new("upload"));
        let textures = TextureManager::new(source, tasks, Arc::clone(&upload_queue));
        let meshes = MeshManager::new(Arc::clone(&upload_queue));
        let materials =
            MaterialManager::new(Arc::clone(&upload_queue), Arc::clone(textures.white()));
        Self {
            textures,
            meshes,
            materials,
            lights: LightManager::new(),
            upload_queue,
            render_targets: Mutex::new(Vec::new()),
        }
    }

    /// Resources over an empty in-memory source, for tests and demos that
    /// use only generated content.
    pub fn headless() -> Self {
        Self::new(Arc::new(MemorySource::new()), Arc::new(TaskRunner::new(1)))
    }

    // --- Managers ---

    /// Texture manager.
    pub fn textures(&self) -> &TextureManager {
        &self.textures
    }

    /// Mesh manager.
    pub fn meshes(&self) -> &MeshManager {
        &self.meshes
    }

    /// Material and shader manager.
    pub fn materials(&self) -> &MaterialManager {
        &self.materials
    }

    /// Light manager.
    pub fn lights(&self) -> &LightManager {
        &self.lights
    }

    /// The GL-thread upload queue.
    pub fn upload_queue(&self) -> &Arc<UploadQueue> {
        &self.upload_queue
    }

    // --- Render targets ---

    /// Create an offscreen render target and schedule its allocation.
    pub fn create_render_target(
        &self,
        label: impl Into<String>,
        extent: Extent2d,
    ) -> Arc<RenderTargetEntry> {
        let entry = Arc::new(RenderTargetEntry::new(label, extent));
        self.render_targets.lock().push(Arc::clone(&entry));
        request_upload(
            &self.upload_queue,
            AnyEntry::RenderTarget(Arc::clone(&entry)),
        );
        entry
    }

    /// Re-schedule render targets whose extent changed since their last
    /// allocation. Call once per render-loop iteration.
    pub fn maintain(&self) {
        for entry in self.render_targets.lock().iter() {
            if entry.core().state() == EntryState::Outdated {
                request_upload(
                    &self.upload_queue,
                    AnyEntry::RenderTarget(Arc::clone(entry)),
                );
            }
        }
    }

    /// Run queued uploads on the render thread within a time budget.
    pub fn service_uploads(
        &self,
        device: &mut (dyn RenderDevice + 'static),
        budget: Duration,
    ) -> Duration {
        self.upload_queue.run_for(device, budget)
    }
}

static_assertions::assert_impl_all!(RenderResources: Send, Sync);
