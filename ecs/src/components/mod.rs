//! Engine-owned component types.

pub mod behavior;
pub mod kinematics;
pub mod transform;

pub use behavior::{Behave, Behavior, run_behaviors};
pub use kinematics::Velocity;
pub use transform::{GlobalTransform, Transform};
