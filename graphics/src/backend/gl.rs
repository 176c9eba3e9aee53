//! OpenGL render device built on `glow`.
//!
//! Targets OpenGL 3.3 core. The device owns the `glow::Context` and maps
//! plain `u32` handles to the context's native objects, so the rest of the
//! crate never touches GL types. All GL entry points are unsafe in `glow`;
//! each call site is kept to a narrow block.

use std::collections::HashMap;

use glow::HasContext;
use silkweed_core::math::Mat4;

use crate::error::GraphicsError;
use crate::types::{Color, CpuMesh, CpuTexture, Extent2d, Rect, TextureFormat, Vertex};

use super::{MeshHandle, ProgramHandle, RenderDevice, RenderTargetHandle, TextureHandle};

/// OpenGL device. Must be created and used on the context's thread.
pub struct GlowDevice {
    gl: glow::Context,
    next_id: u32,
    textures: HashMap<u32, glow::Texture>,
    programs: HashMap<u32, glow::Program>,
    buffers: HashMap<u32, glow::Buffer>,
    vaos: HashMap<u32, glow::VertexArray>,
    framebuffers: HashMap<u32, glow::Framebuffer>,
    depth_buffers: HashMap<u32, glow::Renderbuffer>,
    uniform_locations: HashMap<(u32, String), Option<glow::UniformLocation>>,
    bound_program: Option<u32>,
}

impl GlowDevice {
    /// Create a device from a GL function loader.
    ///
    /// # Safety
    ///
    /// The loader must come from a live GL context that is current on the
    /// calling thread and stays current for the device's lifetime.
    pub unsafe fn new(loader: impl FnMut(&str) -> *const std::ffi::c_void) -> Self {
        let gl = glow::Context::from_loader_function(loader);
        unsafe {
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        }
        log::info!("glow device ready: {}", unsafe {
            gl.get_parameter_string(glow::VERSION)
        });
        Self {
            gl,
            next_id: 0,
            textures: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            vaos: HashMap::new(),
            framebuffers: HashMap::new(),
            depth_buffers: HashMap::new(),
            uniform_locations: HashMap::new(),
            bound_program: None,
        }
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn uniform_location(&mut self, name: &str) -> Option<glow::UniformLocation> {
        let program_id = self.bound_program?;
        let program = *self.programs.get(&program_id)?;
        let key = (program_id, name.to_string());
        if let Some(cached) = self.uniform_locations.get(&key) {
            return cached.clone();
        }
        let location = unsafe { self.gl.get_uniform_location(program, name) };
        if location.is_none() {
            log::debug!("uniform '{name}' not found in program {program_id}");
        }
        self.uniform_locations.insert(key, location.clone());
        location
    }

    fn compile_stage(
        &self,
        label: &str,
        stage: u32,
        source: &str,
    ) -> Result<glow::Shader, GraphicsError> {
        unsafe {
            let shader = self.gl.create_shader(stage).map_err(|err| {
                GraphicsError::ResourceCreationFailed(format!("create_shader: {err}"))
            })?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(GraphicsError::ShaderCompileFailed {
                    label: label.to_string(),
                    log,
                });
            }
            Ok(shader)
        }
    }

    fn upload_pixels(&self, texture: &CpuTexture) {
        let (internal, layout) = match texture.format() {
            TextureFormat::Rgba8 => (glow::RGBA8, glow::RGBA),
            TextureFormat::Rgb8 => (glow::RGB8, glow::RGB),
            TextureFormat::R8 => (glow::R8, glow::RED),
            // Rejected by CpuTexture::new.
            TextureFormat::Depth24Stencil8 => return,
        };
        let extent = texture.extent();
        unsafe {
            // Tightly packed rows regardless of format width.
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal as i32,
                extent.width as i32,
                extent.height as i32,
                0,
                layout,
                glow::UNSIGNED_BYTE,
                Some(texture.pixels()),
            );
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);
        }
    }
}

impl RenderDevice for GlowDevice {
    fn name(&self) -> &'static str {
        "OpenGL"
    }

    fn set_viewport(&mut self, rect: Rect) {
        unsafe {
            self.gl
                .viewport(rect.x, rect.y, rect.width as i32, rect.height as i32);
        }
    }

    fn set_depth_test(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn set_blend(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::BLEND);
            } else {
                self.gl.disable(glow::BLEND);
            }
        }
    }

    fn set_cull_backface(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::CULL_FACE);
                self.gl.cull_face(glow::BACK);
            } else {
                self.gl.disable(glow::CULL_FACE);
            }
        }
    }

    fn clear(&mut self, color: Option<Color>, depth: bool) {
        let mut mask = 0;
        if let Some(color) = color {
            unsafe {
                self.gl.clear_color(color.r, color.g, color.b, color.a);
            }
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if depth {
            mask |= glow::DEPTH_BUFFER_BIT | glow::STENCIL_BUFFER_BIT;
        }
        if mask != 0 {
            unsafe {
                self.gl.clear(mask);
            }
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        if let Some(native) = self.programs.get(&program.0) {
            unsafe {
                self.gl.use_program(Some(*native));
            }
            self.bound_program = Some(program.0);
        } else {
            log::error!("use_program with unknown handle {}", program.0);
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        if let Some(native) = self.textures.get(&texture.0) {
            unsafe {
                self.gl.active_texture(glow::TEXTURE0 + unit);
                self.gl.bind_texture(glow::TEXTURE_2D, Some(*native));
            }
        } else {
            log::error!("bind_texture with unknown handle {}", texture.0);
        }
    }

    fn set_uniform_mat4(&mut self, name: &str, value: &Mat4) {
        if let Some(location) = self.uniform_location(name) {
            unsafe {
                self.gl
                    .uniform_matrix_4_f32_slice(Some(&location), false, value.as_slice());
            }
        }
    }

    fn set_uniform_vec4(&mut self, name: &str, value: [f32; 4]) {
        if let Some(location) = self.uniform_location(name) {
            unsafe {
                self.gl
                    .uniform_4_f32(Some(&location), value[0], value[1], value[2], value[3]);
            }
        }
    }

    fn set_uniform_vec3(&mut self, name: &str, value: [f32; 3]) {
        if let Some(location) = self.uniform_location(name) {
            unsafe {
                self.gl
                    .uniform_3_f32(Some(&location), value[0], value[1], value[2]);
            }
        }
    }

    fn set_uniform_f32(&mut self, name: &str, value: f32) {
        if let Some(location) = self.uniform_location(name) {
            unsafe {
                self.gl.uniform_1_f32(Some(&location), value);
            }
        }
    }

    fn set_uniform_i32(&mut self, name: &str, value: i32) {
        if let Some(location) = self.uniform_location(name) {
            unsafe {
                self.gl.uniform_1_i32(Some(&location), value);
            }
        }
    }

    fn draw_mesh(&mut self, mesh: &MeshHandle) {
        if let Some(vao) = self.vaos.get(&mesh.vao) {
            unsafe {
                self.gl.bind_vertex_array(Some(*vao));
                self.gl.draw_elements(
                    glow::TRIANGLES,
                    mesh.index_count as i32,
                    glow::UNSIGNED_INT,
                    0,
                );
            }
        } else {
            log::error!("draw_mesh with unknown vao {}", mesh.vao);
        }
    }

    fn create_texture(&mut self, texture: &CpuTexture) -> Result<TextureHandle, GraphicsError> {
        let native = unsafe { self.gl.create_texture() }
            .map_err(GraphicsError::ResourceCreationFailed)?;
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(native));
        }
        self.upload_pixels(texture);
        let id = self.alloc_id();
        self.textures.insert(id, native);
        Ok(TextureHandle(id))
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        if let Some(native) = self.textures.remove(&handle.0) {
            unsafe {
                self.gl.delete_texture(native);
            }
        }
    }

    fn create_mesh(&mut self, mesh: &CpuMesh) -> Result<MeshHandle, GraphicsError> {
        unsafe {
            let vao = self
                .gl
                .create_vertex_array()
                .map_err(GraphicsError::ResourceCreationFailed)?;
            let vertex_buffer = self
                .gl
                .create_buffer()
                .map_err(GraphicsError::ResourceCreationFailed)?;
            let index_buffer = self
                .gl
                .create_buffer()
                .map_err(GraphicsError::ResourceCreationFailed)?;

            self.gl.bind_vertex_array(Some(vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, mesh.vertex_bytes(), glow::STATIC_DRAW);
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                mesh.index_bytes(),
                glow::STATIC_DRAW,
            );

            let stride = std::mem::size_of::<Vertex>() as i32;
            self.gl.enable_vertex_attrib_array(0);
            self.gl
                .vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            self.gl.enable_vertex_attrib_array(1);
            self.gl
                .vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 12);
            self.gl.enable_vertex_attrib_array(2);
            self.gl
                .vertex_attrib_pointer_f32(2, 2, glow::FLOAT, false, stride, 24);
            self.gl.bind_vertex_array(None);

            let vao_id = self.alloc_id();
            let vertex_id = self.alloc_id();
            let index_id = self.alloc_id();
            self.vaos.insert(vao_id, vao);
            self.buffers.insert(vertex_id, vertex_buffer);
            self.buffers.insert(index_id, index_buffer);
            Ok(MeshHandle {
                vao: vao_id,
                vertex_buffer: vertex_id,
                index_buffer: index_id,
                index_count: mesh.index_count(),
            })
        }
    }

    fn delete_mesh(&mut self, handle: MeshHandle) {
        unsafe {
            if let Some(vao) = self.vaos.remove(&handle.vao) {
                self.gl.delete_vertex_array(vao);
            }
            if let Some(buffer) = self.buffers.remove(&handle.vertex_buffer) {
                self.gl.delete_buffer(buffer);
            }
            if let Some(buffer) = self.buffers.remove(&handle.index_buffer) {
                self.gl.delete_buffer(buffer);
            }
        }
    }

    fn create_program(
        &mut self,
        label: &str,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, GraphicsError> {
        let vertex = self.compile_stage(label, glow::VERTEX_SHADER, vertex_src)?;
        let fragment = match self.compile_stage(label, glow::FRAGMENT_SHADER, fragment_src) {
            Ok(fragment) => fragment,
            Err(err) => {
                unsafe {
                    self.gl.delete_shader(vertex);
                }
                return Err(err);
            }
        };
        unsafe {
            let program = self.gl.create_program().map_err(|err| {
                GraphicsError::ResourceCreationFailed(format!("create_program: {err}"))
            })?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(GraphicsError::ProgramLinkFailed {
                    label: label.to_string(),
                    log,
                });
            }
            let id = self.alloc_id();
            self.programs.insert(id, program);
            Ok(ProgramHandle(id))
        }
    }

    fn delete_program(&mut self, handle: ProgramHandle) {
        if let Some(native) = self.programs.remove(&handle.0) {
            unsafe {
                self.gl.delete_program(native);
            }
        }
        self.uniform_locations
            .retain(|(program_id, _), _| *program_id != handle.0);
        if self.bound_program == Some(handle.0) {
            self.bound_program = None;
        }
    }

    fn create_render_target(
        &mut self,
        extent: Extent2d,
    ) -> Result<RenderTargetHandle, GraphicsError> {
        unsafe {
            let framebuffer = self
                .gl
                .create_framebuffer()
                .map_err(GraphicsError::ResourceCreationFailed)?;
            let color = self
                .gl
                .create_texture()
                .map_err(GraphicsError::ResourceCreationFailed)?;
            let depth = self
                .gl
                .create_renderbuffer()
                .map_err(GraphicsError::ResourceCreationFailed)?;

            self.gl.bind_texture(glow::TEXTURE_2D, Some(color));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                extent.width as i32,
                extent.height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                None,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );

            self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH24_STENCIL8,
                extent.width as i32,
                extent.height as i32,
            );

            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(color),
                0,
            );
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_STENCIL_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(depth),
            );
            let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                self.gl.delete_framebuffer(framebuffer);
                self.gl.delete_texture(color);
                self.gl.delete_renderbuffer(depth);
                return Err(GraphicsError::ResourceCreationFailed(format!(
                    "framebuffer incomplete: 0x{status:x}"
                )));
            }

            let framebuffer_id = self.alloc_id();
            let color_id = self.alloc_id();
            self.framebuffers.insert(framebuffer_id, framebuffer);
            self.textures.insert(color_id, color);
            self.depth_buffers.insert(framebuffer_id, depth);
            Ok(RenderTargetHandle {
                framebuffer: framebuffer_id,
                color: TextureHandle(color_id),
                extent,
            })
        }
    }

    fn delete_render_target(&mut self, handle: RenderTargetHandle) {
        unsafe {
            if let Some(framebuffer) = self.framebuffers.remove(&handle.framebuffer) {
                self.gl.delete_framebuffer(framebuffer);
            }
            if let Some(depth) = self.depth_buffers.remove(&handle.framebuffer) {
                self.gl.delete_renderbuffer(depth);
            }
        }
        self.delete_texture(handle.color);
    }

    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>) {
        match target {
            Some(handle) => {
                if let Some(framebuffer) = self.framebuffers.get(&handle.framebuffer) {
                    unsafe {
                        self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(*framebuffer));
                    }
                } else {
                    log::error!("bind_render_target with unknown handle {}", handle.framebuffer);
                }
            }
            None => unsafe {
                self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            },
        }
    }

    fn drain_errors(&mut self, operation: &str) -> u32 {
        let mut drained = 0;
        loop {
            let error = unsafe { self.gl.get_error() };
            if error == glow::NO_ERROR {
                break;
            }
            drained += 1;
            log::error!("GL error 0x{error:x} during {operation}");
        }
        drained
    }
}
