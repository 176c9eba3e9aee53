//! Dummy render device for testing and headless runs.
//!
//! This device performs no GPU work. It allocates monotonically increasing
//! ids and records every command it receives, so tests can assert on the
//! exact command stream a renderer produced.

use silkweed_core::math::Mat4;

use crate::error::GraphicsError;
use crate::types::{Color, CpuMesh, CpuTexture, Extent2d, Rect};

use super::{MeshHandle, ProgramHandle, RenderDevice, RenderTargetHandle, TextureHandle};

/// One recorded device command.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    SetViewport(Rect),
    SetDepthTest(bool),
    SetBlend(bool),
    SetCullBackface(bool),
    Clear { color: Option<Color>, depth: bool },
    UseProgram(u32),
    BindTexture { unit: u32, texture: u32 },
    UniformMat4(String),
    UniformVec4(String, [f32; 4]),
    UniformVec3(String, [f32; 3]),
    UniformF32(String, f32),
    UniformI32(String, i32),
    DrawMesh { vao: u32, index_count: u32 },
    CreateTexture(u32),
    DeleteTexture(u32),
    CreateMesh(u32),
    DeleteMesh(u32),
    CreateProgram(u32),
    DeleteProgram(u32),
    CreateRenderTarget(u32),
    DeleteRenderTarget(u32),
    BindRenderTarget(Option<u32>),
}

/// Recording device with no GPU behind it.
#[derive(Debug, Default)]
pub struct DummyDevice {
    next_id: u32,
    calls: Vec<DeviceCall>,
    fail_texture_creates: bool,
    fail_program_creates: bool,
}

impl DummyDevice {
    /// Create a new dummy device.
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands recorded so far.
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Take the recorded commands, leaving the log empty.
    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of draw commands recorded.
    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DeviceCall::DrawMesh { .. }))
            .count()
    }

    /// Make every subsequent texture creation fail, for exercising the
    /// placeholder fallback path.
    pub fn set_fail_texture_creates(&mut self, fail: bool) {
        self.fail_texture_creates = fail;
    }

    /// Make every subsequent program creation fail.
    pub fn set_fail_program_creates(&mut self, fail: bool) {
        self.fail_program_creates = fail;
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, call: DeviceCall) {
        log::trace!("DummyDevice: {call:?}");
        self.calls.push(call);
    }
}

impl RenderDevice for DummyDevice {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn set_viewport(&mut self, rect: Rect) {
        self.record(DeviceCall::SetViewport(rect));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.record(DeviceCall::SetDepthTest(enabled));
    }

    fn set_blend(&mut self, enabled: bool) {
        self.record(DeviceCall::SetBlend(enabled));
    }

    fn set_cull_backface(&mut self, enabled: bool) {
        self.record(DeviceCall::SetCullBackface(enabled));
    }

    fn clear(&mut self, color: Option<Color>, depth: bool) {
        self.record(DeviceCall::Clear { color, depth });
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.record(DeviceCall::UseProgram(program.0));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.record(DeviceCall::BindTexture {
            unit,
            texture: texture.0,
        });
    }

    fn set_uniform_mat4(&mut self, name: &str, _value: &Mat4) {
        self.record(DeviceCall::UniformMat4(name.to_string()));
    }

    fn set_uniform_vec4(&mut self, name: &str, value: [f32; 4]) {
        self.record(DeviceCall::UniformVec4(name.to_string(), value));
    }

    fn set_uniform_vec3(&mut self, name: &str, value: [f32; 3]) {
        self.record(DeviceCall::UniformVec3(name.to_string(), value));
    }

    fn set_uniform_f32(&mut self, name: &str, value: f32) {
        self.record(DeviceCall::UniformF32(name.to_string(), value));
    }

    fn set_uniform_i32(&mut self, name: &str, value: i32) {
        self.record(DeviceCall::UniformI32(name.to_string(), value));
    }

    fn draw_mesh(&mut self, mesh: &MeshHandle) {
        self.record(DeviceCall::DrawMesh {
            vao: mesh.vao,
            index_count: mesh.index_count,
        });
    }

    fn create_texture(&mut self, texture: &CpuTexture) -> Result<TextureHandle, GraphicsError> {
        if self.fail_texture_creates {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "dummy device configured to fail texture '{}'",
                texture.label()
            )));
        }
        let id = self.alloc_id();
        self.record(DeviceCall::CreateTexture(id));
        Ok(TextureHandle(id))
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        self.record(DeviceCall::DeleteTexture(handle.0));
    }

    fn create_mesh(&mut self, mesh: &CpuMesh) -> Result<MeshHandle, GraphicsError> {
        let vao = self.alloc_id();
        let vertex_buffer = self.alloc_id();
        let index_buffer = self.alloc_id();
        self.record(DeviceCall::CreateMesh(vao));
        Ok(MeshHandle {
            vao,
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        })
    }

    fn delete_mesh(&mut self, handle: MeshHandle) {
        self.record(DeviceCall::DeleteMesh(handle.vao));
    }

    fn create_program(
        &mut self,
        label: &str,
        _vertex_src: &str,
        _fragment_src: &str,
    ) -> Result<ProgramHandle, GraphicsError> {
        if self.fail_program_creates {
            return Err(GraphicsError::ProgramLinkFailed {
                label: label.to_string(),
                log: "dummy device configured to fail programs".to_string(),
            });
        }
        let id = self.alloc_id();
        self.record(DeviceCall::CreateProgram(id));
        Ok(ProgramHandle(id))
    }

    fn delete_program(&mut self, handle: ProgramHandle) {
        self.record(DeviceCall::DeleteProgram(handle.0));
    }

    fn create_render_target(
        &mut self,
        extent: Extent2d,
    ) -> Result<RenderTargetHandle, GraphicsError> {
        let framebuffer = self.alloc_id();
        let color = TextureHandle(self.alloc_id());
        self.record(DeviceCall::CreateRenderTarget(framebuffer));
        Ok(RenderTargetHandle {
            framebuffer,
            color,
            extent,
        })
    }

    fn delete_render_target(&mut self, handle: RenderTargetHandle) {
        self.record(DeviceCall::DeleteRenderTarget(handle.framebuffer));
    }

    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>) {
        self.record(DeviceCall::BindRenderTarget(
            target.map(|t| t.framebuffer),
        ));
    }

    fn drain_errors(&mut self, _operation: &str) -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut device = DummyDevice::new();
        let a = device.create_texture(&CpuTexture::solid([0, 0, 0, 255]));
        let b = device.create_texture(&CpuTexture::solid([0, 0, 0, 255]));
        assert_ne!(a.ok(), b.ok());
    }

    #[test]
    fn test_records_command_order() {
        let mut device = DummyDevice::new();
        device.set_depth_test(true);
        device.clear(Some(Color::BLACK), true);
        assert_eq!(
            device.calls(),
            &[
                DeviceCall::SetDepthTest(true),
                DeviceCall::Clear {
                    color: Some(Color::BLACK),
                    depth: true
                },
            ]
        );
    }

    #[test]
    fn test_configured_texture_failure() {
        let mut device = DummyDevice::new();
        device.set_fail_texture_creates(true);
        let result = device.create_texture(&CpuTexture::solid([255, 255, 255, 255]));
        assert!(matches!(
            result,
            Err(GraphicsError::ResourceCreationFailed(_))
        ));
    }
}
