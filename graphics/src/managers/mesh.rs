//! Mesh manager.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::entry::{AnyEntry, MeshEntry, UploadQueue, request_upload};
use crate::error::GraphicsError;
use crate::types::{CpuMesh, generate_cube, generate_quad, generate_uv_sphere};

/// Identity of the built-in unit quad.
pub const BUILTIN_QUAD: &str = "builtin/quad";
/// Identity of the built-in unit cube.
pub const BUILTIN_CUBE: &str = "builtin/cube";
/// Identity of the built-in unit sphere.
pub const BUILTIN_SPHERE: &str = "builtin/sphere";

/// Procedural mesh source invoked lazily on first lookup.
pub type MeshFactory = Box<dyn Fn() -> CpuMesh + Send + Sync>;

/// Maps mesh identities to GPU entries.
///
/// Named meshes are keyed by their label; anonymous meshes by a hash of
/// their geometry, so two identical anonymous shapes share one entry.
/// The built-in primitives are registered as factories and materialized
/// on first use.
pub struct MeshManager {
    upload_queue: Arc<UploadQueue>,
    entries: Mutex<HashMap<String, Arc<MeshEntry>>>,
    factories: Mutex<HashMap<String, MeshFactory>>,
}

impl MeshManager {
    pub(crate) fn new(upload_queue: Arc<UploadQueue>) -> Self {
        let mut factories: HashMap<String, MeshFactory> = HashMap::new();
        factories.insert(
            BUILTIN_QUAD.to_string(),
            Box::new(|| generate_quad(0.5, 0.5)),
        );
        factories.insert(BUILTIN_CUBE.to_string(), Box::new(|| generate_cube(0.5)));
        factories.insert(
            BUILTIN_SPHERE.to_string(),
            Box::new(|| generate_uv_sphere(0.5, 16, 24)),
        );
        Self {
            upload_queue,
            entries: Mutex::new(HashMap::new()),
            factories: Mutex::new(factories),
        }
    }

    // --- Lookup & creation ---

    /// Get the entry for a mesh identity, creating it from its registered
    /// factory on first request.
    ///
    /// Unlike textures, meshes have no byte loader. An identity with no
    /// existing entry and no factory is an error.
    pub fn get_or_create(&self, name: &str) -> Result<Arc<MeshEntry>, GraphicsError> {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(name) {
            return Ok(Arc::clone(entry));
        }

        let factories = self.factories.lock();
        let Some(factory) = factories.get(name) else {
            return Err(GraphicsError::InvalidIdentity(format!(
                "no mesh or mesh factory named '{name}'"
            )));
        };
        let entry = Arc::new(MeshEntry::from_cpu(factory().with_label(name)));
        drop(factories);

        entries.insert(name.to_string(), Arc::clone(&entry));
        request_upload(&self.upload_queue, AnyEntry::Mesh(Arc::clone(&entry)));
        Ok(entry)
    }

    /// Look up an existing entry by identity without creating one.
    pub fn get(&self, name: &str) -> Option<Arc<MeshEntry>> {
        self.entries.lock().get(name).map(Arc::clone)
    }

    /// Insert geometry, keyed by its label or by content hash if unlabeled.
    ///
    /// Inserting under an existing identity replaces the geometry in place;
    /// holders of the `Arc` see the new shape after the next upload pass.
    pub fn insert(&self, mesh: CpuMesh) -> Arc<MeshEntry> {
        let key = if mesh.label().is_empty() {
            format!("mesh#{:016x}", mesh.content_hash())
        } else {
            mesh.label().to_string()
        };
        let mesh = mesh.with_label(key.as_str());
        let mut entries = self.entries.lock();
        let entry = match entries.get(&key) {
            Some(existing) => {
                existing.set_pending(mesh);
                Arc::clone(existing)
            }
            None => {
                let entry = Arc::new(MeshEntry::from_cpu(mesh));
                entries.insert(key, Arc::clone(&entry));
                entry
            }
        };
        request_upload(&self.upload_queue, AnyEntry::Mesh(Arc::clone(&entry)));
        entry
    }

    /// Register a procedural source for an identity.
    pub fn register_factory(&self, name: &str, factory: impl Fn() -> CpuMesh + Send + Sync + 'static) {
        self.factories
            .lock()
            .insert(name.to_string(), Box::new(factory));
    }

    // --- Built-in primitives ---

    /// Unit quad in the XY plane, created on first use.
    pub fn quad(&self) -> Arc<MeshEntry> {
        self.get_or_insert_with(BUILTIN_QUAD, || generate_quad(0.5, 0.5))
    }

    /// Unit cube, created on first use.
    pub fn cube(&self) -> Arc<MeshEntry> {
        self.get_or_insert_with(BUILTIN_CUBE, || generate_cube(0.5))
    }

    /// Unit-diameter sphere, created on first use.
    pub fn sphere(&self) -> Arc<MeshEntry> {
        self.get_or_insert_with(BUILTIN_SPHERE, || generate_uv_sphere(0.5, 16, 24))
    }

    // --- Iteration ---

    /// Number of registered entries.
    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Find the identity of an entry by `Arc` pointer.
    pub fn find_name(&self, entry: &Arc<MeshEntry>) -> Option<String> {
        self.entries
            .lock()
            .iter()
            .find(|(_, candidate)| Arc::ptr_eq(candidate, entry))
            .map(|(key, _)| key.clone())
    }

    fn get_or_insert_with(&self, name: &str, build: impl FnOnce() -> CpuMesh) -> Arc<MeshEntry> {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(name) {
            return Arc::clone(entry);
        }
        let entry = Arc::new(MeshEntry::from_cpu(build().with_label(name)));
        entries.insert(name.to_string(), Arc::clone(&entry));
        request_upload(&self.upload_queue, AnyEntry::Mesh(Arc::clone(&entry)));
        entry
    }
}
