//! # Spinning Shapes
//!
//! A small scene that exercises the whole engine path: a world full of
//! moving entities on the logical thread, frames through the shared slot,
//! and the render loop drawing them.
//!
//! What it shows:
//! - Kinematic motion: a ring of cubes spinning on angular velocity alone
//! - Behaviors: a glass sphere bobbing on a closure behavior
//! - Hierarchy: a small moon parented to the sphere, orbiting as it bobs
//! - Lights: one directional sun plus a warm point light riding the moon
//!
//! Without the `glow-window` feature the demo runs headless on the
//! recording dummy device and exits after a fixed number of frames, which
//! makes a plain `cargo run` double as a smoke test.

use std::error::Error;
use std::f32::consts::{FRAC_PI_2, TAU};
use std::sync::Arc;

use silkweed_app::{App, AppArgs, DefaultAppArgs};
use silkweed_core::math::{Vec3, quat_from_rotation_x};
use silkweed_ecs::rendering::{Camera, LightSource, LogicalRenderer, MeshRenderer};
use silkweed_ecs::{
    Behavior, Engine, GlobalTransform, Transform, Velocity, World, register_engine_components,
    set_parent,
};
use silkweed_graphics::{Color, FrameSlot, LightBlock, MaterialDesc, RenderResources};

const CUBE_COUNT: usize = 8;
const RING_RADIUS: f32 = 5.0;

/// Build the demo world against the shared resource managers.
fn build_scene(resources: &RenderResources) -> Result<World, Box<dyn Error>> {
    let mut world = World::new();
    register_engine_components(&mut world);

    let materials = resources.materials();
    let forward = Arc::clone(materials.forward_shader());
    let crate_mat = materials.register(
        MaterialDesc::new("crate", Arc::clone(&forward)).with_base_color(Color::rgb(0.7, 0.45, 0.2)),
    )?;
    let pearl = materials.register(
        MaterialDesc::new("pearl", Arc::clone(&forward))
            .with_base_color(Color::rgb(0.9, 0.9, 0.85)),
    )?;
    let glass = materials.register(
        MaterialDesc::new("glass", forward)
            .with_base_color(Color::new(0.6, 0.8, 0.9, 0.45))
            .with_transparency(),
    )?;
    let floor_mat = materials.register(
        MaterialDesc::new("floor", Arc::clone(materials.forward_shader()))
            .with_base_color(Color::rgb(0.35, 0.35, 0.38)),
    )?;

    let sun = resources.lights().register(LightBlock::directional(
        "sun",
        [-0.4, -1.0, -0.3],
        Color::WHITE,
        1.2,
    ))?;
    let lamp = resources.lights().register(LightBlock::point(
        "lamp",
        6.0,
        Color::rgb(1.0, 0.8, 0.5),
        2.0,
    ))?;

    // Main camera looking down at the ring.
    let camera = world.spawn();
    world.insert(
        camera,
        Camera {
            clear_color: Color::new(0.08, 0.09, 0.12, 1.0),
            ..Camera::default()
        },
    )?;
    world.insert(
        camera,
        Transform::from_xyz(0.0, 4.0, 10.0).looking_at(Vec3::zeros(), Vec3::y()),
    )?;
    world.insert(camera, GlobalTransform::identity())?;

    // The sun has no position; the direction lives in the block.
    let sun_entity = world.spawn();
    world.insert(sun_entity, LightSource::new(sun))?;
    world.insert(sun_entity, Transform::from_xyz(0.0, 10.0, 0.0))?;
    world.insert(sun_entity, GlobalTransform::identity())?;

    // Static floor, a quad rotated flat. The engine skips it every tick.
    let floor = world.spawn();
    world.insert(floor, MeshRenderer::new(floor_mat, resources.meshes().quad()))?;
    world.insert(
        floor,
        Transform::from_xyz(0.0, -1.0, 0.0)
            .with_rotation(quat_from_rotation_x(-FRAC_PI_2))
            .with_uniform_scale(14.0),
    )?;
    world.insert(floor, GlobalTransform::identity())?;
    world.set_static(floor, true);

    // A ring of cubes, each spinning at its own rate. Alternating materials
    // still leave only two cube batches per frame.
    let cube = resources.meshes().cube();
    for i in 0..CUBE_COUNT {
        let angle = i as f32 / CUBE_COUNT as f32 * TAU;
        let material = if i % 2 == 0 { &crate_mat } else { &pearl };
        let spin = 0.6 + i as f32 * 0.15;

        let entity = world.spawn();
        world.insert(
            entity,
            MeshRenderer::new(Arc::clone(material), Arc::clone(&cube)),
        )?;
        world.insert(
            entity,
            Transform::from_xyz(angle.cos() * RING_RADIUS, 0.5, angle.sin() * RING_RADIUS),
        )?;
        world.insert(entity, GlobalTransform::identity())?;
        world.insert(entity, Velocity::angular(Vec3::new(0.0, spin, 0.0)))?;
    }

    // Glass sphere bobbing on a closure behavior, slowly turning so the
    // parented moon orbits it.
    let sphere = world.spawn();
    world.insert(
        sphere,
        MeshRenderer::new(glass, resources.meshes().sphere()),
    )?;
    world.insert(sphere, Transform::from_xyz(0.0, 2.0, 0.0))?;
    world.insert(sphere, GlobalTransform::identity())?;
    world.insert(sphere, Velocity::angular(Vec3::new(0.0, 1.2, 0.0)))?;
    let mut elapsed = 0.0_f32;
    world.insert(
        sphere,
        Behavior::from_fn(move |world, entity, dt| {
            elapsed += dt;
            if let Some(transform) = world.get_mut::<Transform>(entity) {
                transform.translation.y = 2.0 + (elapsed * 1.5).sin() * 0.5;
            }
        }),
    )?;

    // The moon: a small pearl sphere in the sphere's local space, carrying
    // the point light around the ring.
    let moon = world.spawn();
    world.insert(
        moon,
        MeshRenderer::new(
            Arc::clone(materials.default_material()),
            resources.meshes().sphere(),
        ),
    )?;
    world.insert(
        moon,
        Transform::from_xyz(1.8, 0.3, 0.0).with_uniform_scale(0.3),
    )?;
    world.insert(moon, GlobalTransform::identity())?;
    world.insert(moon, LightSource::new(lamp))?;
    set_parent(&mut world, moon, sphere);

    log::info!(
        "scene ready: 1 camera, 2 lights, {} renderables",
        CUBE_COUNT + 3
    );
    Ok(world)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Silkweed Spinning Shapes demo");
    log::info!("Core version: {}", silkweed_core::VERSION);
    log::info!("Graphics version: {}", silkweed_graphics::VERSION);

    let resources = Arc::new(RenderResources::headless());
    let world = build_scene(&resources).expect("Failed to build scene");

    let slot = Arc::new(FrameSlot::new());
    let engine = Engine::builder()
        .world(world)
        .renderer(LogicalRenderer::new(Arc::clone(&slot)))
        .build()
        .expect("Failed to build engine");

    let mut args = DefaultAppArgs::parse().with_title("Silkweed Spinning Shapes");
    if !cfg!(feature = "glow-window") {
        // Without a GL backend there is nothing to look at; finish after a
        // fixed run instead of spinning invisibly.
        args = args.with_headless(true);
    }
    if args.headless() && args.max_frames().is_none() {
        args = args.with_max_frames(300);
    }

    App::run(engine, resources, slot, args);
}
