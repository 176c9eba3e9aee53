use silkweed_core::math::{Quat, Vec3};

use crate::entity::Entity;

/// Physics backend driven by the engine tick.
///
/// The engine calls [`step`](Physics::step) once per tick with the fixed
/// timestep and reads simulated poses back through
/// [`for_each_pose`](Physics::for_each_pose) before and after the step.
/// Backends decide which entities they track; poses reported for entities
/// that no longer exist are ignored.
pub trait Physics: Send {
    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f32);

    /// Visit every entity pose the backend wants written to transforms.
    fn for_each_pose(&mut self, visit: &mut dyn FnMut(Entity, Vec3, Quat));
}

/// Backend that simulates nothing. Used when no physics is wired in so the
/// tick sequence stays identical either way.
#[derive(Debug, Default)]
pub struct NullPhysics;

impl Physics for NullPhysics {
    fn step(&mut self, _dt: f32) {}

    fn for_each_pose(&mut self, _visit: &mut dyn FnMut(Entity, Vec3, Quat)) {}
}
