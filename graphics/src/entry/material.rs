//! Material entries.

use std::sync::Arc;

use crate::backend::RenderDevice;
use crate::types::Color;

use super::{EntryCore, EntryState, ShaderEntry, TextureEntry};

/// Everything a material needs to draw.
#[derive(Clone)]
pub struct MaterialDesc {
    /// Material identity within the material manager.
    pub name: String,
    /// Program used for draws with this material.
    pub shader: Arc<ShaderEntry>,
    /// Constant color multiplied with the texture.
    pub base_color: Color,
    /// Albedo texture; the white placeholder stands in when absent.
    pub texture: Option<Arc<TextureEntry>>,
    /// Transparent materials draw after opaque geometry with blending on.
    pub transparent: bool,
}

impl MaterialDesc {
    /// A minimal opaque material on the given shader.
    pub fn new(name: impl Into<String>, shader: Arc<ShaderEntry>) -> Self {
        Self {
            name: name.into(),
            shader,
            base_color: Color::WHITE,
            texture: None,
            transparent: false,
        }
    }

    /// Set the base color.
    pub fn with_base_color(mut self, color: Color) -> Self {
        self.base_color = color;
        self
    }

    /// Set the albedo texture.
    pub fn with_texture(mut self, texture: Arc<TextureEntry>) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Mark the material transparent.
    pub fn with_transparency(mut self) -> Self {
        self.transparent = true;
        self
    }
}

/// A material registered with the resource system.
///
/// Materials own no GPU object of their own; their "upload" validates that
/// the referenced shader linked, so a broken material is detected once on
/// the render thread instead of every draw.
pub struct MaterialEntry {
    core: EntryCore,
    desc: MaterialDesc,
}

impl MaterialEntry {
    /// Entry for the given description.
    pub fn new(desc: MaterialDesc) -> Self {
        Self {
            core: EntryCore::new(desc.name.clone()),
            desc,
        }
    }

    /// Lifecycle bookkeeping.
    pub fn core(&self) -> &EntryCore {
        &self.core
    }

    /// Material identity.
    pub fn name(&self) -> &str {
        &self.desc.name
    }

    /// Full description.
    pub fn desc(&self) -> &MaterialDesc {
        &self.desc
    }

    /// Shader this material draws with.
    pub fn shader(&self) -> &Arc<ShaderEntry> {
        &self.desc.shader
    }

    /// Albedo texture, if the material has one.
    pub fn texture(&self) -> Option<&Arc<TextureEntry>> {
        self.desc.texture.as_ref()
    }

    /// Whether this material draws in the transparent pass.
    pub fn is_transparent(&self) -> bool {
        self.desc.transparent
    }

    /// Validate the shader link on the render thread.
    ///
    /// The shader's own upload is enqueued before any material that uses
    /// it, so by FIFO order it has already run when this executes.
    pub fn upload(&self, _device: &mut dyn RenderDevice) {
        if self.desc.shader.core().has_failed() {
            self.core.mark_failed();
            log::warn!(
                "material '{}' disabled: shader '{}' failed",
                self.desc.name,
                self.desc.shader.core().label()
            );
            return;
        }
        self.core.set_uploaded_generation(self.core.generation());
        self.core
            .try_transition(EntryState::Uploading, EntryState::Using);
    }
}

impl std::fmt::Debug for MaterialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialEntry")
            .field("core", &self.core)
            .field("transparent", &self.desc.transparent)
            .finish()
    }
}
