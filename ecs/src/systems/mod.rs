//! Fixed tick phases that walk component storages.

pub mod hierarchy_state;
pub mod kinematics;
pub mod transforms;

pub use hierarchy_state::propagate_entity_state;
pub use kinematics::integrate_kinematics;
pub use transforms::update_world_transforms;
