use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use silkweed_graphics::{
    CameraMaskPolicy, DrawBatch, FrameLight, FrameSlot, MAX_FRAME_LIGHTS, RenderFrame, RenderPart,
};

use crate::components::GlobalTransform;
use crate::entity::Entity;
use crate::sparse_set::Ref;
use crate::world::World;

use super::components::{Camera, LightSource, MeshRenderer};

/// Snapshots the world into [`RenderFrame`]s on the logic thread.
///
/// Collection never touches the GPU: renderables resolve to `Arc`ed entries
/// and model matrices, grouped into batches per camera. The finished frame
/// goes into the shared [`FrameSlot`], where the render thread picks it up
/// or a later frame overwrites it.
pub struct LogicalRenderer {
    slot: Arc<FrameSlot>,
    policy: CameraMaskPolicy,
}

impl LogicalRenderer {
    pub fn new(slot: Arc<FrameSlot>) -> Self {
        Self {
            slot,
            policy: CameraMaskPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CameraMaskPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    /// Build a frame from the world and publish it.
    pub fn publish(&self, world: &World, frame_number: u64, simulation_time: f64) {
        let frame = self.collect(world, frame_number, simulation_time);
        log::trace!(
            "frame {frame_number}: {} cameras, {} batches, {} instances, {} culled",
            frame.stats.cameras,
            frame.stats.batches,
            frame.stats.instances,
            frame.stats.culled
        );
        self.slot.publish(Arc::new(frame));
    }

    fn collect(&self, world: &World, frame_number: u64, simulation_time: f64) -> RenderFrame {
        let mut frame = RenderFrame::new(frame_number, simulation_time);
        let Some(cameras) = world.try_read::<Camera>() else {
            return frame;
        };
        let Some(globals) = world.try_read::<GlobalTransform>() else {
            return frame;
        };

        // Stable sort, so cameras sharing a z-order keep storage order.
        let mut ordered: Vec<(u32, &Camera)> = cameras
            .iter()
            .filter(|(index, _)| world.flags_at(*index) & Entity::DISABLED_BITS == 0)
            .collect();
        ordered.sort_by_key(|(_, camera)| camera.z_order);

        let lights = collect_lights(world, &globals);
        let renderers = world.try_read::<MeshRenderer>();
        let mut drawn: HashSet<u32> = HashSet::new();

        for (camera_index, camera) in ordered {
            let Some(global) = globals.get(camera_index) else {
                continue;
            };
            let mut part = RenderPart::new(camera.params(global.view_matrix()));
            if self.policy.is_world(camera.mask) {
                part.lights = lights.clone();
            }
            if let Some(renderers) = &renderers {
                collect_batches(world, renderers, &globals, camera, &mut part, &mut drawn);
            }
            frame.push_part(part);
        }

        if let Some(renderers) = &renderers {
            for (index, _) in renderers.iter() {
                if world.flags_at(index) & Entity::DISABLED_BITS != 0 {
                    continue;
                }
                if globals.contains(index) && !drawn.contains(&index) {
                    frame.stats.culled += 1;
                }
            }
        }
        frame
    }
}

/// Group one camera's visible renderables into draw batches.
///
/// Instances sharing a (material, mesh) entry pair merge into one batch;
/// batches keep the order the first instance of each pair was seen in, with
/// transparent materials split into the part's second list.
fn collect_batches(
    world: &World,
    renderers: &Ref<'_, MeshRenderer>,
    globals: &Ref<'_, GlobalTransform>,
    camera: &Camera,
    part: &mut RenderPart,
    drawn: &mut HashSet<u32>,
) {
    let mut order: HashMap<(usize, usize), usize> = HashMap::new();
    let mut batches: Vec<DrawBatch> = Vec::new();

    for (index, renderer) in renderers.iter() {
        if world.flags_at(index) & Entity::DISABLED_BITS != 0 {
            continue;
        }
        let Some(global) = globals.get(index) else {
            continue;
        };
        if !camera.mask.intersects(renderer.layers) {
            continue;
        }
        drawn.insert(index);
        let key = (
            Arc::as_ptr(&renderer.material) as usize,
            Arc::as_ptr(&renderer.mesh) as usize,
        );
        match order.get(&key) {
            Some(&at) => batches[at].models.push(global.matrix()),
            None => {
                order.insert(key, batches.len());
                batches.push(DrawBatch::single(
                    Arc::clone(&renderer.material),
                    Arc::clone(&renderer.mesh),
                    global.matrix(),
                ));
            }
        }
    }

    for batch in batches {
        if batch.material.is_transparent() {
            part.transparent.push(batch);
        } else {
            part.opaque.push(batch);
        }
    }
}

/// Gather enabled lights in storage order, capped at the shader limit.
fn collect_lights(world: &World, globals: &Ref<'_, GlobalTransform>) -> Vec<FrameLight> {
    let mut lights = Vec::new();
    let Some(sources) = world.try_read::<LightSource>() else {
        return lights;
    };
    for (index, source) in sources.iter() {
        if world.flags_at(index) & Entity::DISABLED_BITS != 0 {
            continue;
        }
        let Some(global) = globals.get(index) else {
            continue;
        };
        if lights.len() == MAX_FRAME_LIGHTS {
            log::trace!("more than {MAX_FRAME_LIGHTS} active lights, extras dropped");
            break;
        }
        let position = global.translation();
        lights.push(
            source
                .block
                .frame_light([position.x, position.y, position.z]),
        );
    }
    lights
}
