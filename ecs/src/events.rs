//! Double-buffered event channels.

/// Double-buffered event channel, stored as a world resource per event type.
///
/// Events sent during frame N stay readable through frame N+1 and are dropped
/// by the second [`update`](Events::update). Readers running before or after
/// the sender within a tick both get exactly one frame's chance to see every
/// event; nothing is lost to ordering.
pub struct Events<T> {
    current: Vec<T>,
    previous: Vec<T>,
}

impl<T> Events<T> {
    pub fn new() -> Self {
        Self {
            current: Vec::new(),
            previous: Vec::new(),
        }
    }

    pub fn send(&mut self, event: T) {
        self.current.push(event);
    }

    /// Events from the previous frame, then from the current one.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.previous.iter().chain(self.current.iter())
    }

    /// Only events sent since the last [`update`](Events::update).
    pub fn iter_current(&self) -> impl Iterator<Item = &T> {
        self.current.iter()
    }

    /// Rotate the buffers: drop last frame's events, retire the current ones.
    ///
    /// The engine calls this at one fixed point in the tick.
    pub fn update(&mut self) {
        self.previous.clear();
        std::mem::swap(&mut self.previous, &mut self.current);
    }

    pub fn len(&self) -> usize {
        self.previous.len() + self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty() && self.current.is_empty()
    }

    /// Drop everything from both buffers immediately.
    pub fn clear(&mut self) {
        self.previous.clear();
        self.current.clear();
    }
}

impl<T> Default for Events<T> {
    fn default() -> Self {
        Self::new()
    }
}
