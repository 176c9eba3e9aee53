//! Deferred world mutations.
//!
//! Structural changes queued mid-tick (spawns, despawns, component inserts)
//! land in a [`CommandBuffer`] and are applied together at one fixed point in
//! the tick, so iteration never observes a half-mutated world.

use std::sync::Mutex;

use crate::entity::Entity;
use crate::world::World;

/// A deferred world mutation.
pub type Command = Box<dyn FnOnce(&mut World) + Send>;

type ComponentInsert = Box<dyn FnOnce(&mut World, Entity) + Send>;

/// Thread-safe queue of deferred world mutations.
///
/// Any thread may queue commands at any time; the engine drains the buffer
/// once per tick and applies everything in push order.
pub struct CommandBuffer {
    commands: Mutex<Vec<Command>>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Queue an arbitrary command.
    pub fn push(&self, command: impl FnOnce(&mut World) + Send + 'static) {
        match self.commands.lock() {
            Ok(mut queue) => queue.push(Box::new(command)),
            Err(poisoned) => poisoned.into_inner().push(Box::new(command)),
        }
    }

    /// Queue a despawn of a single entity.
    pub fn despawn(&self, entity: Entity) {
        self.push(move |world| {
            world.despawn(entity);
        });
    }

    /// Queue a component insert on an existing entity.
    ///
    /// The insert is dropped with a warning if the entity died before the
    /// buffer was applied.
    pub fn insert<T: Send + Sync + 'static>(&self, entity: Entity, component: T) {
        self.push(move |world| {
            if !world.is_alive(entity) {
                log::warn!("dropping deferred insert on dead entity {entity}");
                return;
            }
            if let Err(err) = world.insert(entity, component) {
                log::warn!("dropping deferred insert: {err}");
            }
        });
    }

    /// Queue a component removal.
    pub fn remove<T: Send + Sync + 'static>(&self, entity: Entity) {
        self.push(move |world| {
            world.remove::<T>(entity);
        });
    }

    /// Start building an entity that will spawn when the buffer is applied.
    pub fn spawn_entity(&self) -> SpawnBuilder<'_> {
        SpawnBuilder {
            buffer: self,
            inserts: Vec::new(),
        }
    }

    /// Take everything queued so far, leaving the buffer empty.
    pub(crate) fn drain(&self) -> Vec<Command> {
        match self.commands.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        match self.commands.lock() {
            Ok(queue) => queue.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder that queues one spawn command together with its initial components.
pub struct SpawnBuilder<'a> {
    buffer: &'a CommandBuffer,
    inserts: Vec<ComponentInsert>,
}

impl SpawnBuilder<'_> {
    /// Attach a component to the entity being built.
    #[must_use]
    pub fn with<T: Send + Sync + 'static>(mut self, component: T) -> Self {
        self.inserts.push(Box::new(move |world, entity| {
            if let Err(err) = world.insert(entity, component) {
                log::warn!("dropping spawn insert: {err}");
            }
        }));
        self
    }

    /// Queue the spawn. The entity comes into existence when the buffer is
    /// applied, not when `build` returns.
    pub fn build(self) {
        let inserts = self.inserts;
        self.buffer.push(move |world| {
            let entity = world.spawn();
            for insert in inserts {
                insert(world, entity);
            }
        });
    }
}
