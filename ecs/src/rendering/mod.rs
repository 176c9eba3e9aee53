//! World-to-frame bridge, enabled by the `rendering` feature.
//!
//! Entities become renderable through three components: [`Camera`],
//! [`MeshRenderer`] and [`LightSource`]. Every tick the engine's
//! [`LogicalRenderer`] snapshots them into an immutable
//! [`RenderFrame`](silkweed_graphics::RenderFrame) and publishes it; the
//! render thread consumes frames on its own schedule and never sees the
//! world itself.

mod components;
mod logical;

pub use components::{Camera, LightSource, MeshRenderer};
pub use logical::LogicalRenderer;

use crate::world::World;

/// Register the renderable component types. Idempotent.
pub fn register_rendering_components(world: &mut World) {
    world.register_component::<Camera>();
    world.register_component::<MeshRenderer>();
    world.register_component::<LightSource>();
}
