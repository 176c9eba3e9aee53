//! World-transform recomputation.

use crate::components::transform::{GlobalTransform, Transform};
use crate::entity::Entity;
use crate::hierarchy::{Children, Parent};
use crate::sparse_set::{Ref, RefMut};
use crate::world::World;

/// Recompute every [`GlobalTransform`] from local transforms and hierarchy.
///
/// Roots copy their local transform into world space; children compose with
/// the parent's world transform, depth first. A root carrying only a
/// [`GlobalTransform`] keeps its value and still serves as the composition
/// base for its subtree.
pub fn update_world_transforms(world: &World) {
    let Some(transforms) = world.try_read::<Transform>() else {
        return;
    };
    let Some(mut globals) = world.try_write::<GlobalTransform>() else {
        return;
    };
    let parents = world.try_read::<Parent>();
    let children = world.try_read::<Children>();

    let has_parent = |index: u32| parents.as_ref().is_some_and(|p| p.contains(index));

    for (index, local) in transforms.iter() {
        if has_parent(index) {
            continue;
        }
        if let Some(global) = globals.get_mut(index) {
            *global = GlobalTransform::from(*local);
        }
    }

    let Some(children) = children.as_ref() else {
        return;
    };
    for (index, kids) in children.iter() {
        if has_parent(index) {
            continue;
        }
        let Some(base) = globals.get(index).copied() else {
            continue;
        };
        for &child in &kids.0 {
            propagate_branch(world, child, base, &transforms, &mut globals, children);
        }
    }
}

fn propagate_branch(
    world: &World,
    entity: Entity,
    parent_global: GlobalTransform,
    transforms: &Ref<'_, Transform>,
    globals: &mut RefMut<'_, GlobalTransform>,
    children: &Ref<'_, Children>,
) {
    if !world.is_alive(entity) {
        return;
    }
    let index = entity.index();
    let Some(local) = transforms.get(index) else {
        return;
    };
    let global = parent_global.mul_local(local);
    if let Some(slot) = globals.get_mut(index) {
        *slot = global;
    }
    if let Some(kids) = children.get(index) {
        for &child in &kids.0 {
            propagate_branch(world, child, global, transforms, globals, children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::set_parent;
    use silkweed_core::math::{Vec3, quat_from_rotation_y};
    use std::f32::consts::FRAC_PI_2;

    fn world_with_transforms() -> World {
        let mut world = World::new();
        world.register_component::<Transform>();
        world.register_component::<GlobalTransform>();
        world
    }

    fn spawn_at(world: &mut World, transform: Transform) -> Entity {
        let entity = world.spawn();
        world.insert(entity, transform).unwrap();
        world.insert(entity, GlobalTransform::identity()).unwrap();
        entity
    }

    fn world_position(world: &World, entity: Entity) -> Vec3 {
        world
            .read::<GlobalTransform>()
            .unwrap()
            .get(entity.index())
            .unwrap()
            .translation()
    }

    #[test]
    fn root_copies_local_transform() {
        let mut world = world_with_transforms();
        let entity = spawn_at(&mut world, Transform::from_xyz(1.0, 2.0, 3.0));
        update_world_transforms(&world);
        assert!((world_position(&world, entity) - Vec3::new(1.0, 2.0, 3.0)).norm() < 1e-5);
    }

    #[test]
    fn child_composes_with_parent() {
        let mut world = world_with_transforms();
        let parent = spawn_at(&mut world, Transform::from_xyz(10.0, 0.0, 0.0));
        let child = spawn_at(&mut world, Transform::from_xyz(0.0, 5.0, 0.0));
        set_parent(&mut world, child, parent);

        update_world_transforms(&world);
        assert!((world_position(&world, child) - Vec3::new(10.0, 5.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn three_level_chain_accumulates() {
        let mut world = world_with_transforms();
        let root = spawn_at(&mut world, Transform::from_xyz(1.0, 0.0, 0.0));
        let mid = spawn_at(&mut world, Transform::from_xyz(0.0, 1.0, 0.0));
        let leaf = spawn_at(&mut world, Transform::from_xyz(0.0, 0.0, 1.0));
        set_parent(&mut world, mid, root);
        set_parent(&mut world, leaf, mid);

        update_world_transforms(&world);
        assert!((world_position(&world, leaf) - Vec3::new(1.0, 1.0, 1.0)).norm() < 1e-5);
    }

    #[test]
    fn parent_rotation_moves_child_position() {
        let mut world = world_with_transforms();
        let parent = spawn_at(
            &mut world,
            Transform::identity().with_rotation(quat_from_rotation_y(FRAC_PI_2)),
        );
        let child = spawn_at(&mut world, Transform::from_xyz(0.0, 0.0, -2.0));
        set_parent(&mut world, child, parent);

        update_world_transforms(&world);
        assert!((world_position(&world, child) - Vec3::new(-2.0, 0.0, 0.0)).norm() < 1e-4);
    }

    #[test]
    fn entity_without_global_is_skipped() {
        let mut world = world_with_transforms();
        let tracked = spawn_at(&mut world, Transform::from_xyz(1.0, 1.0, 1.0));
        let untracked = world.spawn();
        world
            .insert(untracked, Transform::from_xyz(9.0, 9.0, 9.0))
            .unwrap();

        update_world_transforms(&world);
        assert!((world_position(&world, tracked) - Vec3::new(1.0, 1.0, 1.0)).norm() < 1e-5);
        assert!(
            !world
                .read::<GlobalTransform>()
                .unwrap()
                .contains(untracked.index())
        );
    }

    #[test]
    fn manual_root_global_anchors_the_subtree() {
        let mut world = world_with_transforms();
        // Root placed directly in world space, no local transform.
        let root = world.spawn();
        world
            .insert(
                root,
                GlobalTransform::from(Transform::from_xyz(100.0, 0.0, 0.0)),
            )
            .unwrap();
        let child = spawn_at(&mut world, Transform::from_xyz(0.0, 7.0, 0.0));
        set_parent(&mut world, child, root);

        update_world_transforms(&world);
        assert!((world_position(&world, root) - Vec3::new(100.0, 0.0, 0.0)).norm() < 1e-5);
        assert!((world_position(&world, child) - Vec3::new(100.0, 7.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn repeated_runs_are_stable() {
        let mut world = world_with_transforms();
        let parent = spawn_at(&mut world, Transform::from_xyz(3.0, 0.0, 0.0));
        let child = spawn_at(&mut world, Transform::from_xyz(1.0, 0.0, 0.0));
        set_parent(&mut world, child, parent);

        update_world_transforms(&world);
        let first = world_position(&world, child);
        update_world_transforms(&world);
        update_world_transforms(&world);
        assert!((world_position(&world, child) - first).norm() < 1e-6);
    }
}
