use silkweed_core::math::Vec3;

/// World-streaming hook polled once per tick.
///
/// The engine passes the observer position (the primary camera in world
/// space, or the origin while no camera exists) so the provider can load and
/// unload world fragments around it. Providers are expected to do the heavy
/// lifting elsewhere and keep this call cheap.
pub trait FragmentProvider: Send {
    fn provide_fragments(&mut self, observer: Vec3);
}

impl<F: FnMut(Vec3) + Send> FragmentProvider for F {
    fn provide_fragments(&mut self, observer: Vec3) {
        self(observer);
    }
}
