//! Entity handles and the generational slot allocator.
//!
//! An [`Entity`] is a plain value: a slot index plus the world tick it was
//! spawned on. Slots are recycled through a free list; the spawn tick masks
//! out stale handles so a despawned entity's index can be reused safely.

use std::fmt;

use fixedbitset::FixedBitSet;

/// Handle to an entity in a [`World`](crate::World).
///
/// Copyable and cheap to compare. A handle is only meaningful together with
/// the world that produced it; once the entity despawns the handle goes stale
/// and component lookups through it return `None`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    id: u32,
    spawn_tick: u64,
}

impl Entity {
    /// Entity is skipped by behaviors, kinematics, and render collection.
    pub const DISABLED: u32 = 1 << 0;
    /// Disabled state inherited from an ancestor.
    pub const INHERITED_DISABLED: u32 = 1 << 1;
    /// Entity opts out of motion integration and behavior updates.
    pub const STATIC: u32 = 1 << 2;
    /// Static state inherited from an ancestor.
    pub const INHERITED_STATIC: u32 = 1 << 3;

    /// Bits that make an entity effectively disabled.
    pub const DISABLED_BITS: u32 = Self::DISABLED | Self::INHERITED_DISABLED;
    /// Bits that make an entity effectively static.
    pub const STATIC_BITS: u32 = Self::STATIC | Self::INHERITED_STATIC;
    /// Bits owned by hierarchy propagation rather than by user code.
    pub const INHERITED_BITS: u32 = Self::INHERITED_DISABLED | Self::INHERITED_STATIC;

    pub(crate) fn new(id: u32, spawn_tick: u64) -> Self {
        Self { id, spawn_tick }
    }

    /// Slot index inside component storages.
    pub fn index(self) -> u32 {
        self.id
    }

    /// World tick this entity was spawned on.
    pub fn spawn_tick(self) -> u64 {
        self.spawn_tick
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}@{})", self.id, self.spawn_tick)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Slot allocator backing a world's entity set.
///
/// Alive slots are tracked in a bit set so iteration over live entities does
/// not touch the tick or flag arrays for dead slots.
pub(crate) struct EntityAllocator {
    spawn_ticks: Vec<u64>,
    flags: Vec<u32>,
    alive: FixedBitSet,
    free_list: Vec<u32>,
    count: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            spawn_ticks: Vec::new(),
            flags: Vec::new(),
            alive: FixedBitSet::new(),
            free_list: Vec::new(),
            count: 0,
        }
    }

    /// Allocate a slot, reusing the most recently freed one when available.
    pub fn allocate(&mut self, tick: u64) -> Entity {
        let id = match self.free_list.pop() {
            Some(id) => {
                let slot = id as usize;
                // Keep the slot tick monotonic so a handle freed and
                // reallocated on the same tick still compares unequal.
                self.spawn_ticks[slot] = self.spawn_ticks[slot].max(tick);
                self.flags[slot] = 0;
                id
            }
            None => {
                let id = self.spawn_ticks.len() as u32;
                self.spawn_ticks.push(tick);
                self.flags.push(0);
                self.alive.grow(self.spawn_ticks.len());
                id
            }
        };
        self.alive.insert(id as usize);
        self.count += 1;
        Entity::new(id, self.spawn_ticks[id as usize])
    }

    /// Free the entity's slot. Returns `false` for stale or repeated frees.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = entity.index() as usize;
        self.alive.set(slot, false);
        self.spawn_ticks[slot] += 1;
        self.flags[slot] = 0;
        self.free_list.push(entity.index());
        self.count -= 1;
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index() as usize;
        slot < self.spawn_ticks.len()
            && self.alive.contains(slot)
            && self.spawn_ticks[slot] == entity.spawn_tick()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn flags(&self, entity: Entity) -> u32 {
        if self.is_alive(entity) {
            self.flags[entity.index() as usize]
        } else {
            0
        }
    }

    /// Flags of whatever entity currently occupies `index` (0 for dead slots).
    pub fn flags_at(&self, index: u32) -> u32 {
        let slot = index as usize;
        if slot < self.flags.len() && self.alive.contains(slot) {
            self.flags[slot]
        } else {
            0
        }
    }

    pub fn set_flags(&mut self, entity: Entity, bits: u32) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.flags[entity.index() as usize] |= bits;
        true
    }

    pub fn clear_flags(&mut self, entity: Entity, bits: u32) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.flags[entity.index() as usize] &= !bits;
        true
    }

    /// Clear `bits` on every live entity.
    pub fn clear_flags_all(&mut self, bits: u32) {
        for slot in self.alive.ones() {
            self.flags[slot] &= !bits;
        }
    }

    /// Rebuild the handle of the live entity at `index`, if any.
    pub fn entity_at(&self, index: u32) -> Option<Entity> {
        let slot = index as usize;
        if slot < self.spawn_ticks.len() && self.alive.contains(slot) {
            Some(Entity::new(index, self.spawn_ticks[slot]))
        } else {
            None
        }
    }

    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .ones()
            .map(|slot| Entity::new(slot as u32, self.spawn_ticks[slot]))
    }
}
