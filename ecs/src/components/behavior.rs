//! Per-entity game logic.

use crate::entity::Entity;
use crate::world::World;

/// Game logic attached to an entity.
///
/// Behaviors are the one place game code mutates the world during a tick;
/// every other tick phase is engine-owned. The hosting entity is handed back
/// on each update together with full world access.
pub trait Behave: Send + Sync + 'static {
    fn update(&mut self, world: &mut World, entity: Entity, dt: f32);
}

/// Component wrapping a boxed [`Behave`] implementation.
pub struct Behavior(Box<dyn Behave>);

impl Behavior {
    pub fn new(behave: impl Behave) -> Self {
        Self(Box::new(behave))
    }

    /// Wrap a closure as a behavior.
    pub fn from_fn(f: impl FnMut(&mut World, Entity, f32) + Send + Sync + 'static) -> Self {
        Self::new(FnBehave(f))
    }

    fn update(&mut self, world: &mut World, entity: Entity, dt: f32) {
        self.0.update(world, entity, dt);
    }
}

struct FnBehave<F>(F);

impl<F: FnMut(&mut World, Entity, f32) + Send + Sync + 'static> Behave for FnBehave<F> {
    fn update(&mut self, world: &mut World, entity: Entity, dt: f32) {
        (self.0)(world, entity, dt);
    }
}

/// Run every behavior on enabled, non-static entities, in storage order.
///
/// Each behavior is lifted out of the world for the duration of its update so
/// it can freely mutate the world, its own entity included. A behavior that
/// despawns its host stays gone; the lifted value is only restored when the
/// entity is still alive and did not install a replacement meanwhile.
pub fn run_behaviors(world: &mut World, dt: f32) {
    let holders: Vec<Entity> = {
        let Some(behaviors) = world.try_read::<Behavior>() else {
            return;
        };
        behaviors
            .entities()
            .iter()
            .filter_map(|&index| world.entity_at(index))
            .collect()
    };
    for entity in holders {
        if !world.is_enabled(entity) || world.is_static(entity) {
            continue;
        }
        let Some(mut behavior) = world.remove::<Behavior>(entity) else {
            continue;
        };
        behavior.update(world, entity, dt);
        if world.is_alive(entity) && !world.contains::<Behavior>(entity) {
            let _ = world.insert(entity, behavior);
        }
    }
}
