//! Parent/child links between entities.
//!
//! The hierarchy is stored as two components kept in sync by the functions
//! here: [`Parent`] on the child and [`Children`] on the parent. Mutating
//! either component directly will desynchronize the pair; go through
//! [`set_parent`], [`remove_parent`], and [`despawn_recursive`] instead.

use crate::commands::CommandBuffer;
use crate::entity::Entity;
use crate::world::World;

/// Link to the entity's parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Ordered list of the entity's children.
#[derive(Debug, Clone, Default)]
pub struct Children(pub Vec<Entity>);

impl Children {
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Make `entity` a child of `parent`, detaching it from any previous parent.
///
/// Registers the hierarchy components on first use. Dead handles on either
/// side turn the call into a logged no-op.
///
/// # Panics
///
/// Panics when `entity` and `parent` are the same entity, or when `parent`
/// sits inside `entity`'s own subtree (that link would close a cycle).
pub fn set_parent(world: &mut World, entity: Entity, parent: Entity) {
    assert_ne!(
        entity, parent,
        "Cannot set entity as its own parent: {entity}"
    );
    if !world.is_alive(entity) || !world.is_alive(parent) {
        log::warn!("skipping set_parent: {entity} or {parent} is dead");
        return;
    }
    world.register_component::<Parent>();
    world.register_component::<Children>();
    assert!(
        !reaches_upward(world, parent, entity),
        "Cannot parent {entity} to its own descendant {parent}"
    );

    if let Some(Parent(old)) = world.get::<Parent>(entity).copied() {
        if old == parent {
            return;
        }
        detach_from(world, old, entity);
    }
    let _ = world.insert(entity, Parent(parent));
    if let Some(children) = world.get_mut::<Children>(parent) {
        children.0.push(entity);
    } else {
        let _ = world.insert(parent, Children(vec![entity]));
    }
}

/// Detach `entity` from its parent, if it has one.
pub fn remove_parent(world: &mut World, entity: Entity) {
    let Some(Parent(old)) = world.remove::<Parent>(entity) else {
        return;
    };
    detach_from(world, old, entity);
}

/// Despawn an entity together with its whole subtree.
///
/// Returns `false` when the handle was already stale.
pub fn despawn_recursive(world: &mut World, entity: Entity) -> bool {
    if !world.is_alive(entity) {
        return false;
    }
    // Detach from the parent first so the walk never sees a half-linked node.
    if let Some(Parent(parent)) = world.get::<Parent>(entity).copied() {
        detach_from(world, parent, entity);
    }
    despawn_subtree(world, entity);
    true
}

fn despawn_subtree(world: &mut World, entity: Entity) {
    if !world.is_alive(entity) {
        return;
    }
    let children = world
        .remove::<Children>(entity)
        .map(|children| children.0)
        .unwrap_or_default();
    for child in children {
        despawn_subtree(world, child);
    }
    world.despawn(entity);
}

fn detach_from(world: &mut World, parent: Entity, child: Entity) {
    if let Some(children) = world.get_mut::<Children>(parent) {
        children.0.retain(|&c| c != child);
    }
}

/// Walk up the parent chain from `from`; true when `target` is an ancestor.
fn reaches_upward(world: &mut World, from: Entity, target: Entity) -> bool {
    let mut current = from;
    while let Some(Parent(next)) = world.get::<Parent>(current).copied() {
        if next == target {
            return true;
        }
        current = next;
    }
    false
}

/// Deferred hierarchy edits through a [`CommandBuffer`].
pub trait HierarchyCommands {
    fn cmd_set_parent(&self, entity: Entity, parent: Entity);
    fn cmd_remove_parent(&self, entity: Entity);
    fn cmd_despawn_recursive(&self, entity: Entity);
}

impl HierarchyCommands for CommandBuffer {
    fn cmd_set_parent(&self, entity: Entity, parent: Entity) {
        self.push(move |world| set_parent(world, entity, parent));
    }

    fn cmd_remove_parent(&self, entity: Entity) {
        self.push(move |world| remove_parent(world, entity));
    }

    fn cmd_despawn_recursive(&self, entity: Entity) {
        self.push(move |world| {
            despawn_recursive(world, entity);
        });
    }
}
