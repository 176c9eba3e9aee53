//! Single-slot frame handoff between the logical and render threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::frame::RenderFrame;

/// Counter snapshot from a [`FrameSlot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSlotStats {
    /// Frames published by the logical thread.
    pub published: u64,
    /// Frames taken by the render thread.
    pub taken: u64,
    /// Frames overwritten before anyone took them.
    pub dropped: u64,
}

/// Last-writer-wins mailbox holding at most one frame.
///
/// The logical thread publishes every tick without waiting; if the render
/// thread has not consumed the previous frame it is overwritten and
/// counted as dropped. The render thread polls with [`take`](Self::take)
/// and sleeps briefly on a miss. Neither side ever blocks on the other
/// beyond the slot lock itself.
pub struct FrameSlot {
    slot: Mutex<Option<Arc<RenderFrame>>>,
    published: AtomicU64,
    taken: AtomicU64,
    dropped: AtomicU64,
}

impl FrameSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            published: AtomicU64::new(0),
            taken: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Publish a frame, overwriting any unconsumed one.
    pub fn publish(&self, frame: Arc<RenderFrame>) {
        let number = frame.frame_number;
        let previous = self.slot.lock().replace(frame);
        self.published.fetch_add(1, Ordering::Relaxed);
        if let Some(stale) = previous {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::trace!(
                "frame {} dropped unconsumed, replaced by {number}",
                stale.frame_number
            );
        } else {
            log::trace!("frame {number} published");
        }
    }

    /// Take the pending frame, leaving the slot empty.
    pub fn take(&self) -> Option<Arc<RenderFrame>> {
        let frame = self.slot.lock().take();
        if let Some(frame) = &frame {
            self.taken.fetch_add(1, Ordering::Relaxed);
            log::trace!("frame {} taken", frame.frame_number);
        }
        frame
    }

    /// Whether a frame is waiting.
    pub fn has_frame(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> FrameSlotStats {
        FrameSlotStats {
            published: self.published.load(Ordering::Relaxed),
            taken: self.taken.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(FrameSlot: Send, Sync);
