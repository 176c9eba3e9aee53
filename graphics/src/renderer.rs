//! The render-thread frame consumer.

use std::sync::Arc;

use silkweed_core::math::Mat4;

use crate::backend::{ProgramHandle, RenderDevice, TextureHandle};
use crate::camera::CameraMaskPolicy;
use crate::entry::{AnyEntry, EntryState, MaterialEntry, request_upload};
use crate::frame::{DrawBatch, RenderFrame, RenderPart};
use crate::light::MAX_FRAME_LIGHTS;
use crate::managers::RenderResources;
use crate::render_state::{RenderState, RenderStateStats};
use crate::types::{Extent2d, Rect};

/// Turns published [`RenderFrame`]s into device commands.
///
/// One instance lives on the render thread and owns the GL state cache.
/// Frames arrive fully built; the renderer walks their parts in order,
/// resolves entries to live handles, substitutes placeholders for
/// anything not yet uploaded, and re-schedules entries whose content
/// went stale.
pub struct SilkRenderer {
    state: RenderState,
    policy: CameraMaskPolicy,
    target_size: Extent2d,
    frames_rendered: u64,
}

impl SilkRenderer {
    /// Renderer for a target of the given size.
    pub fn new(target_size: Extent2d) -> Self {
        Self::with_policy(target_size, CameraMaskPolicy::default())
    }

    /// Renderer with a custom camera mask policy.
    pub fn with_policy(target_size: Extent2d, policy: CameraMaskPolicy) -> Self {
        Self {
            state: RenderState::new(),
            policy,
            target_size,
            frames_rendered: 0,
        }
    }

    /// Record a target resize.
    ///
    /// Invalidates the state cache so the next part reprograms the
    /// viewport even if its rect is numerically unchanged.
    pub fn set_target_size(&mut self, target_size: Extent2d) {
        self.target_size = target_size;
        self.state.invalidate();
    }

    /// Current target size.
    pub fn target_size(&self) -> Extent2d {
        self.target_size
    }

    /// Frames consumed so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// State cache counters.
    pub fn state_stats(&self) -> RenderStateStats {
        self.state.stats()
    }

    /// Draw one frame to the default target.
    pub fn render_frame(
        &mut self,
        device: &mut dyn RenderDevice,
        resources: &RenderResources,
        frame: &RenderFrame,
    ) {
        for (index, part) in frame.parts.iter().enumerate() {
            self.render_part(device, resources, part, index == 0);
        }
        self.frames_rendered += 1;
        device.drain_errors("render_frame");
        log::trace!(
            "frame {} rendered: {} parts, {} batches",
            frame.frame_number,
            frame.parts.len(),
            frame.stats.batches
        );
    }

    fn render_part(
        &mut self,
        device: &mut dyn RenderDevice,
        resources: &RenderResources,
        part: &RenderPart,
        first: bool,
    ) {
        let viewport = part
            .camera
            .view_rect
            .unwrap_or_else(|| Rect::from(self.target_size));
        self.state.set_viewport(device, viewport);

        // The first part owns the background; later parts draw over it and
        // only reset depth so cameras stack.
        if first {
            device.clear(Some(part.camera.clear_color), true);
        } else {
            device.clear(None, true);
        }

        let world = self.policy.is_world(part.camera.mask);
        self.state.set_depth_test(device, world);
        let fog_distance = if world {
            part.camera.fog_distance
        } else {
            self.policy.hud_fog_distance
        };

        let part_uniforms = PartUniforms {
            view: part.camera.view,
            projection: part.camera.projection.matrix(viewport.aspect_ratio()),
            fog_color: part.camera.clear_color.to_array(),
            fog_distance,
        };

        // Uniforms are program state, so each program bound within this
        // part gets the shared block pushed exactly once.
        let mut initialized: Vec<ProgramHandle> = Vec::new();

        self.state.set_blend(device, false);
        self.state.set_cull_backface(device, true);
        for batch in &part.opaque {
            self.draw_batch(device, resources, part, &part_uniforms, &mut initialized, batch);
        }

        if !part.transparent.is_empty() {
            self.state.set_blend(device, true);
            self.state.set_cull_backface(device, false);
            for batch in &part.transparent {
                self.draw_batch(device, resources, part, &part_uniforms, &mut initialized, batch);
            }
            self.state.set_blend(device, false);
            self.state.set_cull_backface(device, true);
        }
    }

    fn draw_batch(
        &mut self,
        device: &mut dyn RenderDevice,
        resources: &RenderResources,
        part: &RenderPart,
        part_uniforms: &PartUniforms,
        initialized: &mut Vec<ProgramHandle>,
        batch: &DrawBatch,
    ) {
        let Some(mesh) = batch.mesh.handle() else {
            log::trace!("mesh '{}' not ready, batch skipped", batch.mesh.core().label());
            return;
        };

        // A material that has not finished (or failed) its upload draws as
        // the plain white default instead of vanishing.
        let material = if batch.material.core().is_usable() {
            &batch.material
        } else {
            log::trace!(
                "material '{}' not ready, default substituted",
                batch.material.name()
            );
            resources.materials().default_material()
        };
        let Some(program) = material.shader().handle() else {
            log::trace!(
                "no usable program for material '{}', batch skipped",
                material.name()
            );
            return;
        };
        let texture = resolve_texture(resources, material);

        // Handles are resolved above; a stale entry keeps drawing its old
        // content this frame while the refresh is queued.
        reschedule_if_outdated(resources, batch);

        self.state.use_program(device, program);
        if !initialized.contains(&program) {
            push_part_uniforms(device, part, part_uniforms);
            initialized.push(program);
        }

        device.set_uniform_vec4("u_base_color", material.desc().base_color.to_array());
        device.set_uniform_i32("u_texture", 0);
        if let Some(texture) = texture {
            self.state.bind_texture(device, 0, texture);
        }

        for model in &batch.models {
            device.set_uniform_mat4("u_model", model);
            device.draw_mesh(&mesh);
        }
    }
}

struct PartUniforms {
    view: Mat4,
    projection: Mat4,
    fog_color: [f32; 4],
    fog_distance: f32,
}

fn push_part_uniforms(device: &mut dyn RenderDevice, part: &RenderPart, uniforms: &PartUniforms) {
    device.set_uniform_mat4("u_view", &uniforms.view);
    device.set_uniform_mat4("u_projection", &uniforms.projection);
    device.set_uniform_vec4("u_fog_color", uniforms.fog_color);
    device.set_uniform_f32("u_fog_distance", uniforms.fog_distance);

    let count = part.lights.len().min(MAX_FRAME_LIGHTS);
    device.set_uniform_i32("u_light_count", count as i32);
    for (index, light) in part.lights.iter().take(count).enumerate() {
        device.set_uniform_vec3(&format!("u_light_positions[{index}]"), light.position);
        device.set_uniform_vec3(&format!("u_light_colors[{index}]"), light.color);
        device.set_uniform_f32(
            &format!("u_light_directional[{index}]"),
            if light.directional { 1.0 } else { 0.0 },
        );
    }
}

/// Albedo texture handle for a material, falling back to the white
/// placeholder while the real texture is still on its way.
fn resolve_texture(resources: &RenderResources, material: &MaterialEntry) -> Option<TextureHandle> {
    if let Some(entry) = material.texture() {
        if let Some(handle) = entry.handle() {
            return Some(handle);
        }
    }
    resources.textures().white().handle()
}

/// Push stale entries back onto the upload queue. The CAS inside
/// `request_upload` makes repeated calls for one entry idempotent.
fn reschedule_if_outdated(resources: &RenderResources, batch: &DrawBatch) {
    let queue = resources.upload_queue();
    if batch.mesh.core().state() == EntryState::Outdated {
        request_upload(queue, AnyEntry::Mesh(Arc::clone(&batch.mesh)));
    }
    if let Some(texture) = batch.material.texture() {
        if texture.core().state() == EntryState::Outdated {
            request_upload(queue, AnyEntry::Texture(Arc::clone(texture)));
        }
    }
}
