//! The world: entities, components, resources, and the tick counter.
//!
//! Component types must be registered before use so every storage exists up
//! front and lookups never allocate mid-tick. Inserting into an unregistered
//! storage is reported through [`ComponentNotRegistered`] instead of being
//! papered over.

use std::any::{self, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::commands::CommandBuffer;
use crate::entity::{Entity, EntityAllocator};
use crate::events::Events;
use crate::resource::{ResourceRef, ResourceRefMut, Resources};
use crate::sparse_set::{ComponentStorage, Ref, RefMut};

/// Error returned when a component type was never registered with the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentNotRegistered {
    type_name: &'static str,
}

impl ComponentNotRegistered {
    pub(crate) fn new<T>() -> Self {
        Self {
            type_name: any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for ComponentNotRegistered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Component type `{}` has never been registered. Call register_component() first.",
            self.type_name
        )
    }
}

impl std::error::Error for ComponentNotRegistered {}

/// Container for everything the logical loop simulates.
pub struct World {
    entities: EntityAllocator,
    components: HashMap<TypeId, ComponentStorage>,
    resources: Resources,
    event_updaters: Vec<fn(&mut World)>,
    tick: u64,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::new(),
            components: HashMap::new(),
            resources: Resources::new(),
            event_updaters: Vec::new(),
            tick: 0,
        }
    }

    // -- entities --

    /// Create a new empty entity stamped with the current tick.
    pub fn spawn(&mut self) -> Entity {
        self.entities.allocate(self.tick)
    }

    /// Destroy an entity and drop all of its components.
    ///
    /// Returns `false` when the handle is stale. Children are not touched;
    /// use [`despawn_recursive`](crate::hierarchy::despawn_recursive) to take
    /// a subtree down.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.deallocate(entity) {
            return false;
        }
        for storage in self.components.values() {
            storage.remove_untyped(entity.index());
        }
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn entity_count(&self) -> u32 {
        self.entities.count()
    }

    /// Rebuild the handle of the live entity occupying `index`, if any.
    pub fn entity_at(&self, index: u32) -> Option<Entity> {
        self.entities.entity_at(index)
    }

    pub fn iter_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    // -- entity flags --

    /// Raw flag bits for a live entity (0 for stale handles).
    pub fn flags(&self, entity: Entity) -> u32 {
        self.entities.flags(entity)
    }

    pub(crate) fn flags_at(&self, index: u32) -> u32 {
        self.entities.flags_at(index)
    }

    /// Set or clear the manual disabled flag. Returns `false` for stale handles.
    ///
    /// The inherited variant is owned by hierarchy propagation and cannot be
    /// toggled directly.
    pub fn set_disabled(&mut self, entity: Entity, disabled: bool) -> bool {
        if disabled {
            self.entities.set_flags(entity, Entity::DISABLED)
        } else {
            self.entities.clear_flags(entity, Entity::DISABLED)
        }
    }

    /// Set or clear the manual static flag. Returns `false` for stale handles.
    pub fn set_static(&mut self, entity: Entity, is_static: bool) -> bool {
        if is_static {
            self.entities.set_flags(entity, Entity::STATIC)
        } else {
            self.entities.clear_flags(entity, Entity::STATIC)
        }
    }

    /// Live and not disabled, directly or through an ancestor.
    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity) && self.entities.flags(entity) & Entity::DISABLED_BITS == 0
    }

    /// Marked static, directly or through an ancestor.
    pub fn is_static(&self, entity: Entity) -> bool {
        self.entities.flags(entity) & Entity::STATIC_BITS != 0
    }

    pub(crate) fn set_flags(&mut self, entity: Entity, bits: u32) -> bool {
        self.entities.set_flags(entity, bits)
    }

    pub(crate) fn clear_flags(&mut self, entity: Entity, bits: u32) -> bool {
        self.entities.clear_flags(entity, bits)
    }

    pub(crate) fn clear_flags_all(&mut self, bits: u32) {
        self.entities.clear_flags_all(bits);
    }

    // -- components --

    /// Create the storage for component type `T`. Idempotent.
    pub fn register_component<T: Send + Sync + 'static>(&mut self) {
        self.components
            .entry(TypeId::of::<T>())
            .or_insert_with(ComponentStorage::new::<T>);
    }

    pub fn is_component_registered<T: 'static>(&self) -> bool {
        self.components.contains_key(&TypeId::of::<T>())
    }

    /// Attach a component to a live entity, replacing any existing value.
    ///
    /// # Panics
    ///
    /// Panics when `entity` is stale; inserting onto a despawned entity would
    /// silently attach data to whatever reuses the slot.
    pub fn insert<T: Send + Sync + 'static>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), ComponentNotRegistered> {
        assert!(
            self.entities.is_alive(entity),
            "Cannot insert component on dead entity {entity}"
        );
        let storage = self
            .components
            .get_mut(&TypeId::of::<T>())
            .ok_or_else(ComponentNotRegistered::new::<T>)?;
        if let Some(set) = storage.set_mut::<T>() {
            set.insert(entity.index(), component);
        }
        Ok(())
    }

    /// Detach and return a component. `None` for stale handles or absent data.
    pub fn remove<T: Send + Sync + 'static>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        let storage = self.components.get_mut(&TypeId::of::<T>())?;
        storage.set_mut::<T>()?.remove(entity.index())
    }

    pub fn get<T: Send + Sync + 'static>(&mut self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        let storage = self.components.get_mut(&TypeId::of::<T>())?;
        storage.set_mut::<T>()?.get(entity.index())
    }

    pub fn get_mut<T: Send + Sync + 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        let storage = self.components.get_mut(&TypeId::of::<T>())?;
        storage.set_mut::<T>()?.get_mut(entity.index())
    }

    pub fn contains<T: 'static>(&self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        self.components
            .get(&TypeId::of::<T>())
            .is_some_and(|storage| storage.contains_untyped(entity.index()))
    }

    /// Borrow the whole storage of `T` for reading.
    ///
    /// # Panics
    ///
    /// Panics if the storage is currently borrowed mutably.
    pub fn read<T: Send + Sync + 'static>(&self) -> Result<Ref<'_, T>, ComponentNotRegistered> {
        let storage = self
            .components
            .get(&TypeId::of::<T>())
            .ok_or_else(ComponentNotRegistered::new::<T>)?;
        storage
            .read::<T>()
            .ok_or_else(ComponentNotRegistered::new::<T>)
    }

    /// Borrow the whole storage of `T` for writing.
    ///
    /// # Panics
    ///
    /// Panics if the storage is currently borrowed in any way.
    pub fn write<T: Send + Sync + 'static>(&self) -> Result<RefMut<'_, T>, ComponentNotRegistered> {
        let storage = self
            .components
            .get(&TypeId::of::<T>())
            .ok_or_else(ComponentNotRegistered::new::<T>)?;
        storage
            .write::<T>()
            .ok_or_else(ComponentNotRegistered::new::<T>)
    }

    /// Like [`read`](Self::read) but `None` when `T` was never registered.
    pub fn try_read<T: Send + Sync + 'static>(&self) -> Option<Ref<'_, T>> {
        self.read::<T>().ok()
    }

    pub fn try_write<T: Send + Sync + 'static>(&self) -> Option<RefMut<'_, T>> {
        self.write::<T>().ok()
    }

    // -- resources --

    pub fn insert_resource<T: Send + Sync + 'static>(&mut self, value: T) {
        self.resources.insert(value);
    }

    pub fn remove_resource<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.resources.remove::<T>()
    }

    pub fn has_resource<T: 'static>(&self) -> bool {
        self.resources.contains::<T>()
    }

    /// Borrow a resource for reading.
    ///
    /// # Panics
    ///
    /// Panics if the resource does not exist or is borrowed mutably.
    pub fn resource<T: 'static>(&self) -> ResourceRef<'_, T> {
        self.resources.borrow::<T>()
    }

    /// Borrow a resource for writing.
    ///
    /// # Panics
    ///
    /// Panics if the resource does not exist or is already borrowed.
    pub fn resource_mut<T: 'static>(&self) -> ResourceRefMut<'_, T> {
        self.resources.borrow_mut::<T>()
    }

    pub(crate) fn resource_get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.resources.get_mut::<T>()
    }

    // -- ticks --

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    // -- events --

    /// Register the double-buffered channel for event type `T`. Idempotent.
    pub fn add_event<T: Send + Sync + 'static>(&mut self) {
        if self.has_resource::<Events<T>>() {
            return;
        }
        self.insert_resource(Events::<T>::new());
        self.event_updaters.push(update_event_channel::<T>);
    }

    /// Queue an event on its channel.
    ///
    /// # Panics
    ///
    /// Panics if `add_event::<T>` was never called.
    pub fn send_event<T: Send + Sync + 'static>(&self, event: T) {
        self.resource_mut::<Events<T>>().send(event);
    }

    /// Advance every registered event channel by one frame.
    ///
    /// Runs at one fixed point in the tick so event visibility does not
    /// depend on system ordering.
    pub fn update_events(&mut self) {
        let mut updaters = std::mem::take(&mut self.event_updaters);
        for update in &updaters {
            update(self);
        }
        // An updater may have registered new channels meanwhile.
        updaters.append(&mut self.event_updaters);
        self.event_updaters = updaters;
    }

    // -- deferred commands --

    /// Install the command buffer resource. Idempotent.
    pub fn init_commands(&mut self) {
        if !self.has_resource::<CommandBuffer>() {
            self.insert_resource(CommandBuffer::new());
        }
    }

    /// Borrow the command buffer for queueing.
    ///
    /// # Panics
    ///
    /// Panics if [`init_commands`](Self::init_commands) was never called.
    pub fn commands(&self) -> ResourceRef<'_, CommandBuffer> {
        self.resource::<CommandBuffer>()
    }

    /// Drain the command buffer and apply every queued command in order.
    ///
    /// Commands queued while applying run on the next drain, keeping each
    /// tick's structural changes bounded.
    pub fn apply_commands(&mut self) -> usize {
        let commands = match self.resources.get_mut::<CommandBuffer>() {
            Some(buffer) => buffer.drain(),
            None => return 0,
        };
        let count = commands.len();
        for command in commands {
            command(self);
        }
        count
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn update_event_channel<T: Send + Sync + 'static>(world: &mut World) {
    if let Some(events) = world.resources.get_mut::<Events<T>>() {
        events.update();
    }
}

static_assertions::assert_impl_all!(World: Send);
