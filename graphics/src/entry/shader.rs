//! Shader program entries and the built-in forward shaders.

use crate::backend::{ProgramHandle, RenderDevice};

use super::{DoubleBuffered, EntryCore, EntryState};

/// GLSL source pair for one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    /// Vertex stage source.
    pub vertex: String,
    /// Fragment stage source.
    pub fragment: String,
}

/// A shader program registered with the resource system.
///
/// Compilation and linking happen on the render thread like any other
/// upload. Sources are kept after linking so the program can be rebuilt
/// if the device is ever recreated.
pub struct ShaderEntry {
    core: EntryCore,
    sources: ShaderSources,
    handle: DoubleBuffered<ProgramHandle>,
}

impl ShaderEntry {
    /// Entry for a program built from the given sources.
    pub fn new(label: impl Into<String>, sources: ShaderSources) -> Self {
        Self {
            core: EntryCore::new(label),
            sources,
            handle: DoubleBuffered::new(),
        }
    }

    /// Lifecycle bookkeeping.
    pub fn core(&self) -> &EntryCore {
        &self.core
    }

    /// The linked program.
    ///
    /// `None` until the first upload links one; after that the last
    /// published program stays bindable while relinks are in flight.
    pub fn handle(&self) -> Option<ProgramHandle> {
        self.handle.live()
    }

    /// GLSL sources.
    pub fn sources(&self) -> &ShaderSources {
        &self.sources
    }

    /// Compile and link on the render thread.
    pub fn upload(&self, device: &mut dyn RenderDevice) {
        let generation = self.core.generation();
        match device.create_program(
            self.core.label(),
            &self.sources.vertex,
            &self.sources.fragment,
        ) {
            Ok(handle) => {
                for retired in self.handle.publish(handle) {
                    device.delete_program(retired);
                }
                self.core.set_uploaded_generation(generation);
                self.core
                    .try_transition(EntryState::Uploading, EntryState::Using);
                log::debug!("shader '{}' linked", self.core.label());
            }
            Err(err) => {
                self.core.mark_failed();
                log::error!("shader '{}' failed: {err}", self.core.label());
            }
        }
    }

    /// Delete any live program. Render thread only.
    pub fn release(&self, device: &mut dyn RenderDevice) {
        for retired in [self.handle.live()].into_iter().flatten() {
            device.delete_program(retired);
        }
    }
}

impl std::fmt::Debug for ShaderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderEntry").field("core", &self.core).finish()
    }
}

// ============================================================================
// Built-in forward shaders
// ============================================================================

/// Vertex stage of the built-in forward shader.
pub fn forward_vertex_source() -> &'static str {
    r"#version 330 core
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec2 a_uv;

uniform mat4 u_model;
uniform mat4 u_view;
uniform mat4 u_projection;

out vec3 v_world_position;
out vec3 v_normal;
out vec2 v_uv;
out float v_view_depth;

void main() {
    vec4 world = u_model * vec4(a_position, 1.0);
    vec4 view = u_view * world;
    v_world_position = world.xyz;
    v_normal = mat3(u_model) * a_normal;
    v_uv = a_uv;
    v_view_depth = -view.z;
    gl_Position = u_projection * view;
}
"
}

/// Fragment stage of the built-in forward shader.
///
/// Lambert lighting from up to four lights, a base color modulated by one
/// texture, and linear distance fog that fades to the clear color.
pub fn forward_fragment_source() -> &'static str {
    r"#version 330 core
in vec3 v_world_position;
in vec3 v_normal;
in vec2 v_uv;
in float v_view_depth;

uniform sampler2D u_texture;
uniform vec4 u_base_color;
uniform vec4 u_fog_color;
uniform float u_fog_distance;
uniform int u_light_count;
uniform vec3 u_light_positions[4];
uniform vec3 u_light_colors[4];
uniform float u_light_directional[4];

out vec4 frag_color;

void main() {
    vec3 normal = normalize(v_normal);
    vec3 lit = vec3(0.15);
    for (int i = 0; i < u_light_count; ++i) {
        vec3 to_light = u_light_directional[i] > 0.5
            ? normalize(-u_light_positions[i])
            : normalize(u_light_positions[i] - v_world_position);
        lit += u_light_colors[i] * max(dot(normal, to_light), 0.0);
    }
    vec4 albedo = texture(u_texture, v_uv) * u_base_color;
    vec3 color = albedo.rgb * lit;
    float fog = u_fog_distance > 0.0
        ? clamp(v_view_depth / u_fog_distance, 0.0, 1.0)
        : 0.0;
    frag_color = vec4(mix(color, u_fog_color.rgb, fog), albedo.a);
}
"
}

/// Sources for the built-in forward shader.
pub fn forward_sources() -> ShaderSources {
    ShaderSources {
        vertex: forward_vertex_source().to_string(),
        fragment: forward_fragment_source().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyDevice;

    #[test]
    fn link_failure_marks_entry_failed() {
        let entry = ShaderEntry::new("broken", forward_sources());
        let mut device = DummyDevice::new();
        device.set_fail_program_creates(true);

        assert!(entry
            .core()
            .try_transition(EntryState::Created, EntryState::Uploading));
        entry.upload(&mut device);

        assert!(entry.core().has_failed());
        assert_eq!(entry.handle(), None);
    }
}
