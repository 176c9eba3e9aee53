//! Cached GL state with redundant-change elimination.

use crate::backend::{ProgramHandle, RenderDevice, TextureHandle};
use crate::types::Rect;

/// Texture units the cache tracks, matching the forward shader's needs.
pub const MAX_TEXTURE_UNITS: usize = 8;

/// Counter snapshot from a [`RenderState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStateStats {
    /// State changes pushed to the device.
    pub applied: u64,
    /// State changes skipped as redundant.
    pub skipped: u64,
}

/// Shadow copy of the device state the renderer cares about.
///
/// Every setter compares against the last value it pushed and suppresses
/// the device call when nothing changed, so drawing a hundred batches
/// with one material costs one program bind. `None` means unknown;
/// [`invalidate`](RenderState::invalidate) resets everything to unknown
/// after anything outside the cache touches the device.
#[derive(Debug, Default)]
pub struct RenderState {
    program: Option<ProgramHandle>,
    textures: [Option<TextureHandle>; MAX_TEXTURE_UNITS],
    viewport: Option<Rect>,
    depth_test: Option<bool>,
    blend: Option<bool>,
    cull_backface: Option<bool>,
    stats: RenderStateStats,
}

impl RenderState {
    /// A cache with every value unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a program unless it is already bound.
    pub fn use_program(&mut self, device: &mut dyn RenderDevice, program: ProgramHandle) {
        if self.program == Some(program) {
            self.stats.skipped += 1;
            return;
        }
        device.use_program(program);
        self.program = Some(program);
        self.stats.applied += 1;
    }

    /// Bind a texture to a unit unless it is already bound there.
    pub fn bind_texture(&mut self, device: &mut dyn RenderDevice, unit: u32, texture: TextureHandle) {
        let slot = unit as usize;
        debug_assert!(slot < MAX_TEXTURE_UNITS, "texture unit out of range");
        if slot < MAX_TEXTURE_UNITS && self.textures[slot] == Some(texture) {
            self.stats.skipped += 1;
            return;
        }
        device.bind_texture(unit, texture);
        if slot < MAX_TEXTURE_UNITS {
            self.textures[slot] = Some(texture);
        }
        self.stats.applied += 1;
    }

    /// Program the viewport unless it already matches.
    pub fn set_viewport(&mut self, device: &mut dyn RenderDevice, rect: Rect) {
        if self.viewport == Some(rect) {
            self.stats.skipped += 1;
            return;
        }
        device.set_viewport(rect);
        self.viewport = Some(rect);
        self.stats.applied += 1;
    }

    /// Toggle depth testing unless already in that state.
    pub fn set_depth_test(&mut self, device: &mut dyn RenderDevice, enabled: bool) {
        if self.depth_test == Some(enabled) {
            self.stats.skipped += 1;
            return;
        }
        device.set_depth_test(enabled);
        self.depth_test = Some(enabled);
        self.stats.applied += 1;
    }

    /// Toggle blending unless already in that state.
    pub fn set_blend(&mut self, device: &mut dyn RenderDevice, enabled: bool) {
        if self.blend == Some(enabled) {
            self.stats.skipped += 1;
            return;
        }
        device.set_blend(enabled);
        self.blend = Some(enabled);
        self.stats.applied += 1;
    }

    /// Toggle back-face culling unless already in that state.
    pub fn set_cull_backface(&mut self, device: &mut dyn RenderDevice, enabled: bool) {
        if self.cull_backface == Some(enabled) {
            self.stats.skipped += 1;
            return;
        }
        device.set_cull_backface(enabled);
        self.cull_backface = Some(enabled);
        self.stats.applied += 1;
    }

    /// Forget everything; the next call of each setter hits the device.
    ///
    /// Required after a window resize or any GL work done outside the
    /// cache, since the real state may no longer match the shadow copy.
    pub fn invalidate(&mut self) {
        self.program = None;
        self.textures = [None; MAX_TEXTURE_UNITS];
        self.viewport = None;
        self.depth_test = None;
        self.blend = None;
        self.cull_backface = None;
    }

    /// Counter snapshot.
    pub fn stats(&self) -> RenderStateStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DeviceCall, DummyDevice};

    #[test]
    fn redundant_changes_are_suppressed() {
        let mut device = DummyDevice::new();
        let mut state = RenderState::new();
        let program = ProgramHandle(3);

        state.use_program(&mut device, program);
        state.use_program(&mut device, program);
        state.use_program(&mut device, program);

        let binds = device
            .calls()
            .iter()
            .filter(|call| matches!(call, DeviceCall::UseProgram(_)))
            .count();
        assert_eq!(binds, 1);
        assert_eq!(state.stats().applied, 1);
        assert_eq!(state.stats().skipped, 2);
    }

    #[test]
    fn change_after_invalidate_hits_the_device() {
        let mut device = DummyDevice::new();
        let mut state = RenderState::new();

        state.set_depth_test(&mut device, true);
        state.invalidate();
        state.set_depth_test(&mut device, true);

        let toggles = device
            .calls()
            .iter()
            .filter(|call| matches!(call, DeviceCall::SetDepthTest(_)))
            .count();
        assert_eq!(toggles, 2);
    }

    #[test]
    fn texture_units_are_tracked_independently() {
        let mut device = DummyDevice::new();
        let mut state = RenderState::new();
        let a = TextureHandle(1);
        let b = TextureHandle(2);

        state.bind_texture(&mut device, 0, a);
        state.bind_texture(&mut device, 1, b);
        state.bind_texture(&mut device, 0, a);

        let binds = device
            .calls()
            .iter()
            .filter(|call| matches!(call, DeviceCall::BindTexture { .. }))
            .count();
        assert_eq!(binds, 2);
    }

    #[test]
    fn viewport_reprogrammed_only_on_change() {
        let mut device = DummyDevice::new();
        let mut state = RenderState::new();
        let full = Rect::from_dimensions(800, 600);
        let corner = Rect::new(0, 0, 400, 300);

        state.set_viewport(&mut device, full);
        state.set_viewport(&mut device, full);
        state.set_viewport(&mut device, corner);

        let sets = device
            .calls()
            .iter()
            .filter(|call| matches!(call, DeviceCall::SetViewport(_)))
            .count();
        assert_eq!(sets, 2);
    }
}
