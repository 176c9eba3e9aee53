//! Inherited entity-state propagation.

use crate::entity::Entity;
use crate::hierarchy::{Children, Parent};
use crate::world::World;

/// Push disabled/static state down the hierarchy.
///
/// Runs before transforms and behaviors so a freshly disabled branch is
/// skipped by everything later in the tick. Inherited bits are rebuilt from
/// scratch on every run; an entity detached from a disabled parent loses
/// them without extra bookkeeping.
pub fn propagate_entity_state(world: &mut World) {
    world.clear_flags_all(Entity::INHERITED_BITS);
    if !world.is_component_registered::<Children>() {
        return;
    }

    let roots: Vec<Entity> = {
        let Some(children) = world.try_read::<Children>() else {
            return;
        };
        let parents = world.try_read::<Parent>();
        children
            .entities()
            .iter()
            .filter(|&&index| parents.as_ref().map_or(true, |p| !p.contains(index)))
            .filter_map(|&index| world.entity_at(index))
            .collect()
    };

    for root in roots {
        let flags = world.flags(root);
        propagate_children(
            world,
            root,
            flags & Entity::DISABLED_BITS != 0,
            flags & Entity::STATIC_BITS != 0,
        );
    }
}

fn propagate_children(world: &mut World, parent: Entity, disabled: bool, is_static: bool) {
    let children: Vec<Entity> = match world.get::<Children>(parent) {
        Some(children) => children.0.clone(),
        None => return,
    };
    for child in children {
        if !world.is_alive(child) {
            continue;
        }
        if disabled {
            world.set_flags(child, Entity::INHERITED_DISABLED);
        }
        if is_static {
            world.set_flags(child, Entity::INHERITED_STATIC);
        }
        let flags = world.flags(child);
        propagate_children(
            world,
            child,
            flags & Entity::DISABLED_BITS != 0,
            flags & Entity::STATIC_BITS != 0,
        );
    }
}
