//! Fixed-timestep simulation driver.
//!
//! [`Engine`] owns the [`World`] and advances it with a deterministic tick:
//! physics poses are written back, entity state and world transforms are
//! propagated, kinematic motion integrates, behaviors run, the physics
//! backend steps, and the pose/transform sync repeats so published frames
//! see post-step state. Structural changes queued through the command buffer
//! apply at the end of the tick, followed by doomed-entity destruction and
//! the budgeted worker queues.
//!
//! Engines are built through [`EngineBuilder`]; building without a world is
//! an error rather than a latent panic.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use silkweed_core::math::Vec3;
use silkweed_core::{TickClock, WorkerQueue};

use crate::components::{run_behaviors, Behavior, GlobalTransform, Transform, Velocity};
use crate::entity::Entity;
use crate::hierarchy::{self, Children, Parent};
use crate::systems::{integrate_kinematics, propagate_entity_state, update_world_transforms};
use crate::world::World;

mod physics;
mod state;
mod streaming;

pub use physics::{NullPhysics, Physics};
pub use state::{EngineState, EngineStateChanged};
pub use streaming::FragmentProvider;

/// Time each worker queue may spend inside one tick.
pub const DEFAULT_QUEUE_BUDGET: Duration = Duration::from_millis(1);

/// Budget for flushing leftover work while stopping.
const SHUTDOWN_BUDGET: Duration = Duration::from_millis(50);

/// Sleep between loop iterations of [`Engine::run`] when no tick is due.
const IDLE_SLEEP: Duration = Duration::from_micros(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// [`EngineBuilder::build`] was called without a world.
    MissingWorld,
    /// A lifecycle edge outside the forward chain was requested.
    IllegalTransition { from: EngineState, to: EngineState },
    /// [`Engine::tick`] or [`Engine::run`] was called outside `Running`.
    NotRunning { state: EngineState },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::MissingWorld => {
                write!(f, "engine cannot be built without a world")
            }
            EngineError::IllegalTransition { from, to } => {
                write!(f, "illegal engine transition: {from} -> {to}")
            }
            EngineError::NotRunning { state } => {
                write!(f, "engine is not running (state: {state})")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Listener pose updated from the primary camera every tick.
///
/// Stays at the origin facing -Z while no enabled camera exists, so audio
/// and streaming queries always have a well-defined observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioListener {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Default for AudioListener {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            forward: Vec3::new(0.0, 0.0, -1.0),
        }
    }
}

/// Entities condemned by game code, destroyed in batches at tick end.
///
/// Lives in the world as a resource so behaviors and queued actions can
/// condemn entities without touching storages mid-iteration. Destruction is
/// recursive; descendants of a doomed entity go with it.
#[derive(Debug, Default)]
pub struct DoomedBatches {
    batches: VecDeque<Vec<Entity>>,
}

impl DoomedBatches {
    pub fn push(&mut self, batch: Vec<Entity>) {
        if !batch.is_empty() {
            self.batches.push_back(batch);
        }
    }

    pub fn pop(&mut self) -> Option<Vec<Entity>> {
        self.batches.pop_front()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Per-tick callback run after behaviors, in registration order.
pub type FrameHook = Box<dyn FnMut(&mut World, f32) + Send>;

/// Register every component type the engine tick touches. Idempotent.
pub fn register_engine_components(world: &mut World) {
    world.register_component::<Transform>();
    world.register_component::<GlobalTransform>();
    world.register_component::<Velocity>();
    world.register_component::<Behavior>();
    world.register_component::<Parent>();
    world.register_component::<Children>();
    #[cfg(feature = "rendering")]
    crate::rendering::register_rendering_components(world);
}

/// Assembles an [`Engine`] from its parts.
///
/// Only the world is mandatory. Everything else has a working default: a
/// sixty hertz clock, the null physics backend, no streaming provider and
/// no frame hooks.
#[derive(Default)]
pub struct EngineBuilder {
    world: Option<World>,
    clock: Option<TickClock>,
    physics: Option<Box<dyn Physics>>,
    fragments: Option<Box<dyn FragmentProvider>>,
    frame_hooks: Vec<FrameHook>,
    queue_budget: Duration,
    #[cfg(feature = "rendering")]
    renderer: Option<crate::rendering::LogicalRenderer>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    pub fn clock(mut self, clock: TickClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn physics(mut self, physics: impl Physics + 'static) -> Self {
        self.physics = Some(Box::new(physics));
        self
    }

    pub fn fragments(mut self, provider: impl FragmentProvider + 'static) -> Self {
        self.fragments = Some(Box::new(provider));
        self
    }

    /// Add a callback run every tick after behaviors, in registration order.
    pub fn on_frame(mut self, hook: impl FnMut(&mut World, f32) + Send + 'static) -> Self {
        self.frame_hooks.push(Box::new(hook));
        self
    }

    pub fn queue_budget(mut self, budget: Duration) -> Self {
        self.queue_budget = budget;
        self
    }

    /// Attach the renderer that snapshots the world into frames.
    #[cfg(feature = "rendering")]
    pub fn renderer(mut self, renderer: crate::rendering::LogicalRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Finish assembly.
    ///
    /// Fails with [`EngineError::MissingWorld`] when no world was provided;
    /// a half-configured engine must not limp into the tick loop.
    pub fn build(self) -> Result<Engine, EngineError> {
        let mut world = self.world.ok_or(EngineError::MissingWorld)?;
        register_engine_components(&mut world);
        world.init_commands();
        world.add_event::<EngineStateChanged>();
        if !world.has_resource::<AudioListener>() {
            world.insert_resource(AudioListener::default());
        }
        if !world.has_resource::<DoomedBatches>() {
            world.insert_resource(DoomedBatches::default());
        }

        let clock = self.clock.unwrap_or_else(TickClock::sixty_hz);
        let queue_budget = if self.queue_budget.is_zero() {
            DEFAULT_QUEUE_BUDGET
        } else {
            self.queue_budget
        };
        log::info!(
            "engine built: dt {:.4} s, queue budget {:?}, {} entities pre-seeded",
            clock.dt_seconds(),
            queue_budget,
            world.entity_count()
        );

        Ok(Engine {
            world,
            clock,
            state: EngineState::Initialized,
            physics: self.physics.unwrap_or_else(|| Box::new(NullPhysics)),
            fragments: self.fragments,
            frame_hooks: self.frame_hooks,
            setup_queue: Arc::new(WorkerQueue::new("entity-setup")),
            main_thread_queue: Arc::new(WorkerQueue::new("main-thread")),
            cleanup_queue: Arc::new(WorkerQueue::new("cleanup")),
            queue_budget,
            simulation_time: 0.0,
            stop_flag: Arc::new(AtomicBool::new(false)),
            #[cfg(feature = "rendering")]
            renderer: self.renderer,
        })
    }
}

/// The simulation driver. See the [module docs](self) for the tick order.
pub struct Engine {
    world: World,
    clock: TickClock,
    state: EngineState,
    physics: Box<dyn Physics>,
    fragments: Option<Box<dyn FragmentProvider>>,
    frame_hooks: Vec<FrameHook>,
    setup_queue: Arc<WorkerQueue<World>>,
    main_thread_queue: Arc<WorkerQueue<World>>,
    cleanup_queue: Arc<WorkerQueue<()>>,
    queue_budget: Duration,
    simulation_time: f64,
    stop_flag: Arc<AtomicBool>,
    #[cfg(feature = "rendering")]
    renderer: Option<crate::rendering::LogicalRenderer>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Seconds of simulated time accumulated by completed ticks.
    pub fn simulation_time(&self) -> f64 {
        self.simulation_time
    }

    /// Queue whose actions receive the world; meant for staged entity setup.
    pub fn setup_actions(&self) -> &Arc<WorkerQueue<World>> {
        &self.setup_queue
    }

    /// Queue for work other threads marshal onto the logic thread.
    pub fn main_thread_actions(&self) -> &Arc<WorkerQueue<World>> {
        &self.main_thread_queue
    }

    /// Queue for world-independent teardown work.
    pub fn cleanup_actions(&self) -> &Arc<WorkerQueue<()>> {
        &self.cleanup_queue
    }

    /// Flag polled by [`run`](Self::run); set it from any thread to leave
    /// the loop after the current tick.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    pub fn request_stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    fn transition(&mut self, to: EngineState) -> Result<(), EngineError> {
        if !self.state.can_transition_to(to) {
            return Err(EngineError::IllegalTransition {
                from: self.state,
                to,
            });
        }
        let from = self.state;
        self.state = to;
        self.world.send_event(EngineStateChanged { from, to });
        log::info!("engine state: {from} -> {to}");
        Ok(())
    }

    /// Walk `Initialized -> Starting -> Running`, firing a state event for
    /// each edge.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.transition(EngineState::Starting)?;
        self.transition(EngineState::Running)
    }

    /// Walk `Running -> Stopping -> Stopped`, flushing pending work on the
    /// way out.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        self.transition(EngineState::Stopping)?;
        self.drain_shutdown_work();
        self.transition(EngineState::Stopped)
    }

    /// Advance the simulation by exactly one fixed timestep.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        if self.state != EngineState::Running {
            return Err(EngineError::NotRunning { state: self.state });
        }
        let dt = self.clock.dt_seconds();
        self.world.advance_tick();
        self.world.update_events();

        self.sync_world();
        // Kinematics integrates once per tick; the post-step sync below only
        // refreshes what the physics step moved.
        integrate_kinematics(&self.world, dt);
        run_behaviors(&mut self.world, dt);
        for hook in &mut self.frame_hooks {
            hook(&mut self.world, dt);
        }
        self.update_audio_listener();
        if let Some(provider) = self.fragments.as_mut() {
            let observer = self.world.resource::<AudioListener>().position;
            provider.provide_fragments(observer);
        }
        self.physics.step(dt);
        self.sync_world();

        let applied = self.world.apply_commands();
        if applied > 0 {
            log::trace!("applied {applied} deferred commands");
        }
        self.simulation_time += f64::from(dt);

        #[cfg(feature = "rendering")]
        if let Some(renderer) = &self.renderer {
            renderer.publish(&self.world, self.world.current_tick(), self.simulation_time);
        }

        self.process_doomed();
        self.setup_queue.run_for(&mut self.world, self.queue_budget);
        self.main_thread_queue.run_for(&mut self.world, self.queue_budget);
        self.cleanup_queue.run(self.queue_budget);
        Ok(())
    }

    /// Drive the fixed-tick loop until a stop is requested.
    ///
    /// Starts the engine first when it is still freshly built. Wall time is
    /// folded into whole ticks by the clock; when none is due the thread
    /// sleeps briefly instead of spinning.
    pub fn run(&mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Initialized {
            self.start()?;
        }
        if self.state != EngineState::Running {
            return Err(EngineError::NotRunning { state: self.state });
        }
        log::info!("logic loop entered (dt {:.4} s)", self.clock.dt_seconds());
        let mut last = Instant::now();
        while !self.stop_flag.load(Ordering::Relaxed) {
            let now = Instant::now();
            let ticks = self.clock.advance(now.duration_since(last));
            last = now;
            for _ in 0..ticks {
                self.tick()?;
            }
            if ticks == 0 {
                std::thread::sleep(IDLE_SLEEP);
            }
        }
        log::info!("logic loop leaving after {} ticks", self.world.current_tick());
        self.stop()
    }

    /// Write physics poses back, then refresh entity state and world
    /// transforms from the local ones.
    fn sync_world(&mut self) {
        let world = &mut self.world;
        self.physics.for_each_pose(&mut |entity, translation, rotation| {
            if let Some(transform) = world.get_mut::<Transform>(entity) {
                transform.translation = translation;
                transform.rotation = rotation;
            }
        });
        propagate_entity_state(&mut self.world);
        update_world_transforms(&self.world);
    }

    #[cfg(feature = "rendering")]
    fn update_audio_listener(&mut self) {
        use crate::rendering::Camera;

        let pose = {
            let Some(cameras) = self.world.try_read::<Camera>() else {
                return;
            };
            let Some(globals) = self.world.try_read::<GlobalTransform>() else {
                return;
            };
            let mut best: Option<(i32, Vec3, Vec3)> = None;
            for (index, camera) in cameras.iter() {
                if self.world.flags_at(index) & Entity::DISABLED_BITS != 0 {
                    continue;
                }
                let Some(global) = globals.get(index) else {
                    continue;
                };
                if best.map_or(true, |(z, _, _)| camera.z_order < z) {
                    best = Some((camera.z_order, global.translation(), global.forward()));
                }
            }
            best
        };
        if let Some((_, position, forward)) = pose {
            let mut listener = self.world.resource_mut::<AudioListener>();
            listener.position = position;
            listener.forward = forward;
        }
    }

    #[cfg(not(feature = "rendering"))]
    fn update_audio_listener(&mut self) {}

    fn pop_doomed_batch(&mut self) -> Option<Vec<Entity>> {
        self.world.resource_get_mut::<DoomedBatches>()?.pop()
    }

    /// Destroy doomed batches until the queue empties or the budget runs
    /// out. A started batch always finishes; the budget is checked between
    /// batches so siblings die together.
    fn process_doomed(&mut self) {
        let started = Instant::now();
        while let Some(batch) = self.pop_doomed_batch() {
            let count = batch.len();
            for entity in batch {
                hierarchy::despawn_recursive(&mut self.world, entity);
            }
            log::trace!("destroyed doomed batch of {count}");
            if started.elapsed() >= self.queue_budget {
                break;
            }
        }
    }

    fn drain_shutdown_work(&mut self) {
        self.world.apply_commands();
        while let Some(batch) = self.pop_doomed_batch() {
            for entity in batch {
                hierarchy::despawn_recursive(&mut self.world, entity);
            }
        }
        self.setup_queue.run_for(&mut self.world, SHUTDOWN_BUDGET);
        self.main_thread_queue.run_for(&mut self.world, SHUTDOWN_BUDGET);
        self.cleanup_queue.run(SHUTDOWN_BUDGET);
        let leftover =
            self.setup_queue.len() + self.main_thread_queue.len() + self.cleanup_queue.len();
        if leftover > 0 {
            log::warn!("{leftover} queued actions abandoned at shutdown");
        }
    }
}

static_assertions::assert_impl_all!(Engine: Send);

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use silkweed_core::math::Quat;

    use super::*;
    use crate::events::Events;

    fn running_engine() -> Engine {
        let mut engine = Engine::builder().world(World::new()).build().unwrap();
        engine.start().unwrap();
        engine
    }

    #[test]
    fn build_without_world_fails() {
        let err = Engine::builder().build().err().unwrap();
        assert_eq!(err, EngineError::MissingWorld);
        assert_eq!(err.to_string(), "engine cannot be built without a world");
    }

    #[test]
    fn start_walks_both_edges() {
        let mut engine = Engine::builder().world(World::new()).build().unwrap();
        assert_eq!(engine.state(), EngineState::Initialized);
        engine.start().unwrap();
        assert_eq!(engine.state(), EngineState::Running);

        let events = engine.world().resource::<Events<EngineStateChanged>>();
        let seen: Vec<_> = events.iter().copied().collect();
        assert_eq!(
            seen,
            vec![
                EngineStateChanged {
                    from: EngineState::Initialized,
                    to: EngineState::Starting,
                },
                EngineStateChanged {
                    from: EngineState::Starting,
                    to: EngineState::Running,
                },
            ]
        );
    }

    #[test]
    fn state_events_age_out_after_two_ticks() {
        let mut engine = running_engine();
        engine.tick().unwrap();
        let visible = engine
            .world()
            .resource::<Events<EngineStateChanged>>()
            .iter()
            .count();
        assert_eq!(visible, 2);
        engine.tick().unwrap();
        let visible = engine
            .world()
            .resource::<Events<EngineStateChanged>>()
            .iter()
            .count();
        assert_eq!(visible, 0);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let mut engine = Engine::builder().world(World::new()).build().unwrap();
        let err = engine.stop().err().unwrap();
        assert_eq!(
            err,
            EngineError::IllegalTransition {
                from: EngineState::Initialized,
                to: EngineState::Stopping,
            }
        );
        assert!(err.to_string().contains("illegal"));

        engine.start().unwrap();
        assert!(engine.start().is_err());
        engine.stop().unwrap();
        assert_eq!(engine.state(), EngineState::Stopped);
        assert!(engine.stop().is_err());
    }

    #[test]
    fn tick_outside_running_fails() {
        let mut engine = Engine::builder().world(World::new()).build().unwrap();
        assert_eq!(
            engine.tick().err().unwrap(),
            EngineError::NotRunning {
                state: EngineState::Initialized,
            }
        );
    }

    #[test]
    fn tick_integrates_kinematics_once() {
        let mut engine = running_engine();
        let entity = {
            let world = engine.world_mut();
            let entity = world.spawn();
            world
                .insert(entity, Transform::from_translation(Vec3::zeros()))
                .unwrap();
            world.insert(entity, GlobalTransform::identity()).unwrap();
            world
                .insert(entity, Velocity::linear(Vec3::new(1.0, 0.0, 0.0)))
                .unwrap();
            entity
        };

        for _ in 0..60 {
            engine.tick().unwrap();
        }
        let world = engine.world_mut();
        assert_eq!(world.current_tick(), 60);
        let x = world.get::<Transform>(entity).unwrap().translation.x;
        assert!((x - 1.0).abs() < 1e-4, "moved {x}, expected 1.0");
        // Published state keeps up with the local transform.
        let gx = world.get::<GlobalTransform>(entity).unwrap().translation().x;
        assert!((gx - x).abs() < 1e-6);
    }

    #[test]
    fn behaviors_run_every_tick() {
        #[derive(Default)]
        struct Counter(u32);

        let mut world = World::new();
        world.insert_resource(Counter::default());
        let mut engine = Engine::builder().world(world).build().unwrap();
        let entity = engine.world_mut().spawn();
        engine
            .world_mut()
            .insert(
                entity,
                Behavior::from_fn(|world, _, _| {
                    world.resource_mut::<Counter>().0 += 1;
                }),
            )
            .unwrap();
        engine.start().unwrap();
        for _ in 0..5 {
            engine.tick().unwrap();
        }
        assert_eq!(engine.world().resource::<Counter>().0, 5);
    }

    #[test]
    fn frame_hooks_fire_in_order_after_behaviors() {
        #[derive(Default)]
        struct Trace(Vec<u32>);

        let mut world = World::new();
        world.insert_resource(Trace::default());
        let mut engine = Engine::builder()
            .world(world)
            .on_frame(|world, _| world.resource_mut::<Trace>().0.push(1))
            .on_frame(|world, _| world.resource_mut::<Trace>().0.push(2))
            .build()
            .unwrap();
        let entity = engine.world_mut().spawn();
        engine
            .world_mut()
            .insert(
                entity,
                Behavior::from_fn(|world, _, _| {
                    world.resource_mut::<Trace>().0.push(0);
                }),
            )
            .unwrap();
        engine.start().unwrap();
        engine.tick().unwrap();
        engine.tick().unwrap();
        assert_eq!(engine.world().resource::<Trace>().0, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn commands_apply_within_the_same_tick() {
        let mut engine = Engine::builder()
            .world(World::new())
            .on_frame(|world, _| {
                world.commands().spawn_entity().build();
            })
            .build()
            .unwrap();
        engine.start().unwrap();
        assert_eq!(engine.world().entity_count(), 0);
        engine.tick().unwrap();
        assert_eq!(engine.world().entity_count(), 1);
        engine.tick().unwrap();
        assert_eq!(engine.world().entity_count(), 2);
    }

    #[test]
    fn doomed_batches_destroy_subtrees() {
        let mut engine = running_engine();
        let (parent, child) = {
            let world = engine.world_mut();
            let parent = world.spawn();
            let child = world.spawn();
            hierarchy::set_parent(world, child, parent);
            world.resource_mut::<DoomedBatches>().push(vec![parent]);
            (parent, child)
        };
        engine.tick().unwrap();
        assert!(!engine.world().is_alive(parent));
        assert!(!engine.world().is_alive(child));
        assert!(engine.world().resource::<DoomedBatches>().is_empty());
    }

    #[test]
    fn setup_and_cleanup_queues_run_each_tick() {
        let mut engine = running_engine();
        let cleaned = Arc::new(AtomicU32::new(0));
        let observed = Arc::clone(&cleaned);
        engine.setup_actions().push(|world: &mut World| {
            world.spawn();
        });
        engine.main_thread_actions().push(|world: &mut World| {
            world.spawn();
        });
        engine.cleanup_actions().push(move |_: &mut ()| {
            observed.fetch_add(1, Ordering::Relaxed);
        });
        engine.tick().unwrap();
        assert_eq!(engine.world().entity_count(), 2);
        assert_eq!(cleaned.load(Ordering::Relaxed), 1);
        assert!(engine.setup_actions().is_empty());
    }

    #[test]
    fn panicking_queue_action_spares_its_siblings() {
        let mut engine = running_engine();
        let ran = Arc::new(AtomicU32::new(0));
        let observed = Arc::clone(&ran);
        engine.setup_actions().push(|_: &mut World| {
            panic!("setup action exploded");
        });
        engine.setup_actions().push(move |_: &mut World| {
            observed.fetch_add(1, Ordering::Relaxed);
        });
        engine.tick().unwrap();
        assert_eq!(ran.load(Ordering::Relaxed), 1);
    }

    struct ScriptedPhysics {
        target: Entity,
        steps: Arc<AtomicU32>,
        pose: Vec3,
    }

    impl Physics for ScriptedPhysics {
        fn step(&mut self, dt: f32) {
            self.steps.fetch_add(1, Ordering::Relaxed);
            self.pose.x += dt;
        }

        fn for_each_pose(&mut self, visit: &mut dyn FnMut(Entity, Vec3, Quat)) {
            visit(self.target, self.pose, Quat::identity());
        }
    }

    #[test]
    fn physics_poses_land_after_the_step() {
        let mut world = World::new();
        register_engine_components(&mut world);
        let target = world.spawn();
        world.insert(target, Transform::identity()).unwrap();
        world.insert(target, GlobalTransform::identity()).unwrap();

        let steps = Arc::new(AtomicU32::new(0));
        let mut engine = Engine::builder()
            .world(world)
            .physics(ScriptedPhysics {
                target,
                steps: Arc::clone(&steps),
                pose: Vec3::zeros(),
            })
            .build()
            .unwrap();
        engine.start().unwrap();
        engine.tick().unwrap();

        assert_eq!(steps.load(Ordering::Relaxed), 1);
        let dt = 1.0 / 60.0;
        let x = engine
            .world_mut()
            .get::<Transform>(target)
            .unwrap()
            .translation
            .x;
        assert!((x - dt).abs() < 1e-6, "pose after step should be {dt}, got {x}");
    }

    #[test]
    fn poses_for_dead_entities_are_ignored() {
        let mut world = World::new();
        register_engine_components(&mut world);
        let target = world.spawn();
        world.despawn(target);

        let mut engine = Engine::builder()
            .world(world)
            .physics(ScriptedPhysics {
                target,
                steps: Arc::new(AtomicU32::new(0)),
                pose: Vec3::new(7.0, 0.0, 0.0),
            })
            .build()
            .unwrap();
        engine.start().unwrap();
        engine.tick().unwrap();
    }

    #[test]
    fn fragment_provider_sees_every_tick() {
        let calls = Arc::new(AtomicU32::new(0));
        let observed = Arc::clone(&calls);
        let mut engine = Engine::builder()
            .world(World::new())
            .fragments(move |observer: Vec3| {
                assert_eq!(observer, Vec3::zeros());
                observed.fetch_add(1, Ordering::Relaxed);
            })
            .build()
            .unwrap();
        engine.start().unwrap();
        for _ in 0..3 {
            engine.tick().unwrap();
        }
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn run_honors_the_stop_flag() {
        let mut engine = Engine::builder().world(World::new()).build().unwrap();
        engine.request_stop();
        engine.run().unwrap();
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn identical_inputs_tick_identically() {
        fn build() -> Engine {
            let mut world = World::new();
            register_engine_components(&mut world);
            let entity = world.spawn();
            world
                .insert(entity, Transform::from_translation(Vec3::new(0.5, 0.0, 0.0)))
                .unwrap();
            world.insert(entity, GlobalTransform::identity()).unwrap();
            world
                .insert(
                    entity,
                    Velocity::new(Vec3::new(0.1, 0.2, 0.3), Vec3::new(0.0, 1.3, 0.0)),
                )
                .unwrap();
            let mut engine = Engine::builder().world(world).build().unwrap();
            engine.start().unwrap();
            engine
        }

        let mut left = build();
        let mut right = build();
        for _ in 0..120 {
            left.tick().unwrap();
            right.tick().unwrap();
        }
        let a = left.world_mut().entity_at(0).unwrap();
        let b = right.world_mut().entity_at(0).unwrap();
        let ta = *left.world_mut().get::<Transform>(a).unwrap();
        let tb = *right.world_mut().get::<Transform>(b).unwrap();
        assert_eq!(ta.translation, tb.translation);
        assert_eq!(ta.rotation, tb.rotation);
    }

    #[test]
    fn stop_flushes_pending_work() {
        let mut engine = running_engine();
        let entity = engine.world_mut().spawn();
        engine.world_mut().resource_mut::<DoomedBatches>().push(vec![entity]);
        engine.setup_actions().push(|world: &mut World| {
            world.spawn();
        });
        engine.stop().unwrap();
        assert!(!engine.world().is_alive(entity));
        assert_eq!(engine.world().entity_count(), 1);
        assert!(engine.setup_actions().is_empty());
    }
}
