//! The render-thread consumption loop.
//!
//! Owns the [`SilkRenderer`] and drives one iteration at a time: give the
//! upload queue its time slice, then draw whatever frame is pending. The
//! loop never blocks on the logical thread; a miss is a trace log and a
//! short sleep. The same loop runs behind a window and in headless mode,
//! only the device differs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use silkweed_graphics::{Extent2d, FrameSlot, RenderDevice, RenderResources, SilkRenderer};

/// Upload budget handed to the resource managers per loop iteration.
pub const DEFAULT_UPLOAD_BUDGET: Duration = Duration::from_millis(2);

/// Sleep applied when the slot is empty.
pub(crate) const MISS_SLEEP: Duration = Duration::from_micros(500);

/// Frame consumer tying a slot, a resource bundle and a renderer together.
pub struct RenderLoop {
    renderer: SilkRenderer,
    slot: Arc<FrameSlot>,
    resources: Arc<RenderResources>,
    upload_budget: Duration,
}

impl RenderLoop {
    /// Loop over the given slot and resources, drawing to a target of
    /// `target_size`.
    pub fn new(
        slot: Arc<FrameSlot>,
        resources: Arc<RenderResources>,
        target_size: Extent2d,
    ) -> Self {
        Self {
            renderer: SilkRenderer::new(target_size),
            slot,
            resources,
            upload_budget: DEFAULT_UPLOAD_BUDGET,
        }
    }

    /// Replace the per-iteration upload budget.
    #[must_use]
    pub fn with_upload_budget(mut self, budget: Duration) -> Self {
        self.upload_budget = budget;
        self
    }

    /// The renderer, for target size and state cache counters.
    pub fn renderer(&self) -> &SilkRenderer {
        &self.renderer
    }

    /// Frames drawn so far.
    pub fn frames_rendered(&self) -> u64 {
        self.renderer.frames_rendered()
    }

    /// Record a target resize; the next part reprograms the viewport even
    /// if its rect is numerically unchanged.
    pub fn resize(&mut self, target_size: Extent2d) {
        self.renderer.set_target_size(target_size);
    }

    /// One iteration: service uploads, then draw the pending frame if
    /// there is one. Returns whether a frame was drawn.
    pub fn pump(&mut self, device: &mut (dyn RenderDevice + 'static)) -> bool {
        self.resources.maintain();
        self.resources.service_uploads(device, self.upload_budget);
        match self.slot.take() {
            Some(frame) => {
                self.renderer.render_frame(device, &self.resources, &frame);
                true
            }
            None => {
                log::trace!("no frame pending");
                false
            }
        }
    }

    /// Drive the loop until `stop` is raised or `max_frames` frames have
    /// been drawn. This is the whole render thread in headless runs.
    pub fn run(
        &mut self,
        device: &mut (dyn RenderDevice + 'static),
        stop: &AtomicBool,
        max_frames: Option<u64>,
    ) {
        while !stop.load(Ordering::Relaxed) {
            if max_frames.is_some_and(|limit| self.frames_rendered() >= limit) {
                log::info!("render loop reached {} frames", self.frames_rendered());
                break;
            }
            if !self.pump(device) {
                std::thread::sleep(MISS_SLEEP);
            }
        }
        let stats = self.slot.stats();
        log::info!(
            "render loop done: {} drawn, {} published, {} taken, {} dropped",
            self.frames_rendered(),
            stats.published,
            stats.taken,
            stats.dropped
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silkweed_core::math::Mat4;
    use silkweed_graphics::{CameraParams, DrawBatch, DummyDevice, RenderFrame, RenderPart};

    fn frame_with_one_batch(resources: &RenderResources, number: u64) -> RenderFrame {
        let mut part = RenderPart::new(CameraParams::default());
        part.opaque.push(DrawBatch::single(
            Arc::clone(resources.materials().default_material()),
            resources.meshes().cube(),
            Mat4::identity(),
        ));
        let mut frame = RenderFrame::new(number, 0.0);
        frame.push_part(part);
        frame
    }

    #[test]
    fn pump_draws_the_pending_frame() {
        let slot = Arc::new(FrameSlot::new());
        let resources = Arc::new(RenderResources::headless());
        let mut device = DummyDevice::new();
        let mut render_loop = RenderLoop::new(
            Arc::clone(&slot),
            Arc::clone(&resources),
            Extent2d::new(320, 240),
        );

        slot.publish(Arc::new(frame_with_one_batch(&resources, 1)));
        assert!(render_loop.pump(&mut device));
        assert_eq!(render_loop.frames_rendered(), 1);
        assert_eq!(device.draw_count(), 1);
    }

    #[test]
    fn pump_on_an_empty_slot_is_a_miss() {
        let slot = Arc::new(FrameSlot::new());
        let resources = Arc::new(RenderResources::headless());
        let mut device = DummyDevice::new();
        let mut render_loop = RenderLoop::new(slot, resources, Extent2d::new(320, 240));

        assert!(!render_loop.pump(&mut device));
        assert_eq!(render_loop.frames_rendered(), 0);
    }

    #[test]
    fn pump_services_uploads_each_iteration() {
        let slot = Arc::new(FrameSlot::new());
        let resources = Arc::new(RenderResources::headless());
        let cube = resources.meshes().cube();
        assert!(cube.handle().is_none());

        let mut device = DummyDevice::new();
        let mut render_loop =
            RenderLoop::new(slot, Arc::clone(&resources), Extent2d::new(320, 240));
        render_loop.pump(&mut device);
        assert!(cube.handle().is_some());
    }

    #[test]
    fn resize_reaches_the_renderer() {
        let slot = Arc::new(FrameSlot::new());
        let resources = Arc::new(RenderResources::headless());
        let mut render_loop = RenderLoop::new(slot, resources, Extent2d::new(320, 240));

        render_loop.resize(Extent2d::new(640, 480));
        assert_eq!(render_loop.renderer().target_size(), Extent2d::new(640, 480));
    }

    #[test]
    fn run_stops_at_the_frame_limit() {
        let slot = Arc::new(FrameSlot::new());
        let resources = Arc::new(RenderResources::headless());
        let done = Arc::new(AtomicBool::new(false));

        let producer = {
            let slot = Arc::clone(&slot);
            let resources = Arc::clone(&resources);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                let mut number = 0;
                while !done.load(Ordering::Relaxed) {
                    number += 1;
                    slot.publish(Arc::new(frame_with_one_batch(&resources, number)));
                    std::thread::sleep(Duration::from_micros(200));
                }
            })
        };

        let mut device = DummyDevice::new();
        let mut render_loop = RenderLoop::new(
            Arc::clone(&slot),
            Arc::clone(&resources),
            Extent2d::new(320, 240),
        );
        let stop = AtomicBool::new(false);
        render_loop.run(&mut device, &stop, Some(3));
        assert_eq!(render_loop.frames_rendered(), 3);

        done.store(true, Ordering::Relaxed);
        producer.join().unwrap();
    }

    #[test]
    fn run_honors_an_already_raised_stop_flag() {
        let slot = Arc::new(FrameSlot::new());
        let resources = Arc::new(RenderResources::headless());
        slot.publish(Arc::new(frame_with_one_batch(&resources, 1)));

        let mut device = DummyDevice::new();
        let mut render_loop =
            RenderLoop::new(Arc::clone(&slot), resources, Extent2d::new(320, 240));
        let stop = AtomicBool::new(true);
        render_loop.run(&mut device, &stop, None);

        assert_eq!(render_loop.frames_rendered(), 0);
        assert!(slot.has_frame());
    }
}
