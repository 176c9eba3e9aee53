//! Motion state for kinematic integration.

use silkweed_core::math::Vec3;

/// Linear and angular velocity, integrated into [`Transform`] once per tick.
///
/// Angular velocity is an axis-scaled vector: direction is the spin axis,
/// magnitude is radians per second.
///
/// [`Transform`]: crate::components::Transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Velocity {
    pub fn new(linear: Vec3, angular: Vec3) -> Self {
        Self { linear, angular }
    }

    /// Pure translation.
    pub fn linear(linear: Vec3) -> Self {
        Self::new(linear, Vec3::zeros())
    }

    /// Pure spin.
    pub fn angular(angular: Vec3) -> Self {
        Self::new(Vec3::zeros(), angular)
    }
}

impl Default for Velocity {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_zero_the_other_half() {
        let v = Velocity::linear(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(v.angular, Vec3::zeros());
        let w = Velocity::angular(Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(w.linear, Vec3::zeros());
        assert_eq!(Velocity::default().linear, Vec3::zeros());
    }
}
