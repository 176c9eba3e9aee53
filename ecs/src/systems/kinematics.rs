//! Kinematic motion integration.

use silkweed_core::math::quat_from_axis_angle;

use crate::components::kinematics::Velocity;
use crate::components::transform::Transform;
use crate::entity::Entity;
use crate::world::World;

const MIN_SPIN_RATE: f32 = 1e-6;

/// Integrate velocities into local transforms over `dt` seconds.
///
/// Disabled and static entities keep their pose.
pub fn integrate_kinematics(world: &World, dt: f32) {
    let Some(velocities) = world.try_read::<Velocity>() else {
        return;
    };
    let Some(mut transforms) = world.try_write::<Transform>() else {
        return;
    };

    for (index, velocity) in velocities.iter() {
        if world.flags_at(index) & (Entity::DISABLED_BITS | Entity::STATIC_BITS) != 0 {
            continue;
        }
        let Some(transform) = transforms.get_mut(index) else {
            continue;
        };
        transform.translation += velocity.linear * dt;
        let rate = velocity.angular.norm();
        if rate > MIN_SPIN_RATE {
            let spin = quat_from_axis_angle(velocity.angular, rate * dt);
            transform.rotation = (spin * transform.rotation).normalize();
        }
    }
}
