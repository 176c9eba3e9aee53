//! Shader and material managers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::entry::{
    AnyEntry, MaterialDesc, MaterialEntry, ShaderEntry, ShaderSources, TextureEntry, UploadQueue,
    forward_sources, request_upload,
};
use crate::error::GraphicsError;
use crate::types::Color;

/// Identity of the built-in forward shader.
pub const FORWARD_SHADER: &str = "__forward";
/// Identity of the fallback material.
pub const DEFAULT_MATERIAL: &str = "__default";

/// Maps shader and material identities to GPU entries.
///
/// The forward shader and a plain white default material are registered
/// at construction so the renderer always has something to fall back on.
/// Registration deduplicates by name: registering an identity twice
/// returns the existing entry unchanged.
pub struct MaterialManager {
    upload_queue: Arc<UploadQueue>,
    shaders: Mutex<HashMap<String, Arc<ShaderEntry>>>,
    materials: Mutex<HashMap<String, Arc<MaterialEntry>>>,
    forward: Arc<ShaderEntry>,
    default_material: Arc<MaterialEntry>,
}

impl MaterialManager {
    pub(crate) fn new(upload_queue: Arc<UploadQueue>, white: Arc<TextureEntry>) -> Self {
        let forward = Arc::new(ShaderEntry::new(FORWARD_SHADER, forward_sources()));
        request_upload(&upload_queue, AnyEntry::Shader(Arc::clone(&forward)));

        let default_material = Arc::new(MaterialEntry::new(
            MaterialDesc::new(DEFAULT_MATERIAL, Arc::clone(&forward))
                .with_base_color(Color::WHITE)
                .with_texture(white),
        ));
        request_upload(
            &upload_queue,
            AnyEntry::Material(Arc::clone(&default_material)),
        );

        let mut shaders = HashMap::new();
        shaders.insert(FORWARD_SHADER.to_string(), Arc::clone(&forward));
        let mut materials = HashMap::new();
        materials.insert(DEFAULT_MATERIAL.to_string(), Arc::clone(&default_material));

        Self {
            upload_queue,
            shaders: Mutex::new(shaders),
            materials: Mutex::new(materials),
            forward,
            default_material,
        }
    }

    // --- Shaders ---

    /// Register a shader program under a name.
    ///
    /// On a name collision the already registered entry is returned and the
    /// new sources are discarded.
    pub fn register_shader(
        &self,
        name: &str,
        sources: ShaderSources,
    ) -> Result<Arc<ShaderEntry>, GraphicsError> {
        if name.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "shader registration requires a name".to_string(),
            ));
        }
        let mut shaders = self.shaders.lock();
        if let Some(existing) = shaders.get(name) {
            return Ok(Arc::clone(existing));
        }
        let entry = Arc::new(ShaderEntry::new(name, sources));
        shaders.insert(name.to_string(), Arc::clone(&entry));
        request_upload(&self.upload_queue, AnyEntry::Shader(Arc::clone(&entry)));
        Ok(entry)
    }

    /// Look up a registered shader by name.
    pub fn get_shader(&self, name: &str) -> Option<Arc<ShaderEntry>> {
        self.shaders.lock().get(name).map(Arc::clone)
    }

    /// The built-in forward shader.
    pub fn forward_shader(&self) -> &Arc<ShaderEntry> {
        &self.forward
    }

    // --- Materials ---

    /// Register a material.
    ///
    /// The descriptor carries its own shader and texture references, so
    /// resolution happens here and binding never has to look anything up.
    /// On a name collision the already registered entry is returned.
    pub fn register(&self, desc: MaterialDesc) -> Result<Arc<MaterialEntry>, GraphicsError> {
        if desc.name.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "material registration requires a name".to_string(),
            ));
        }
        let mut materials = self.materials.lock();
        if let Some(existing) = materials.get(&desc.name) {
            return Ok(Arc::clone(existing));
        }
        let name = desc.name.clone();
        let entry = Arc::new(MaterialEntry::new(desc));
        materials.insert(name, Arc::clone(&entry));
        request_upload(&self.upload_queue, AnyEntry::Material(Arc::clone(&entry)));
        Ok(entry)
    }

    /// Look up a registered material by name.
    pub fn get(&self, name: &str) -> Option<Arc<MaterialEntry>> {
        self.materials.lock().get(name).map(Arc::clone)
    }

    /// Plain white material on the forward shader, the stand-in when a
    /// draw's own material is not yet usable.
    pub fn default_material(&self) -> &Arc<MaterialEntry> {
        &self.default_material
    }

    // --- Iteration ---

    /// Number of registered materials, the default included.
    pub fn count(&self) -> usize {
        self.materials.lock().len()
    }

    /// Find the identity of a material by `Arc` pointer.
    pub fn find_name(&self, entry: &Arc<MaterialEntry>) -> Option<String> {
        self.materials
            .lock()
            .iter()
            .find(|(_, candidate)| Arc::ptr_eq(candidate, entry))
            .map(|(key, _)| key.clone())
    }
}
