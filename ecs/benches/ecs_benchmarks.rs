use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use silkweed_core::math::Vec3;
use silkweed_ecs::{
    Engine, GlobalTransform, Transform, Velocity, World, set_parent, update_world_transforms,
};

// ---------------------------------------------------------------------------
// Entity spawning
// ---------------------------------------------------------------------------

fn bench_spawn_entities_1k(c: &mut Criterion) {
    c.bench_function("spawn_1k_entities", |b| {
        b.iter_batched(
            World::new,
            |mut world| {
                for _ in 0..1_000 {
                    black_box(world.spawn());
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_spawn_despawn_churn(c: &mut Criterion) {
    c.bench_function("spawn_despawn_churn_1k", |b| {
        b.iter_batched(
            World::new,
            |mut world| {
                let entities: Vec<_> = (0..1_000).map(|_| world.spawn()).collect();
                for entity in entities {
                    world.despawn(entity);
                }
                for _ in 0..1_000 {
                    black_box(world.spawn());
                }
            },
            BatchSize::SmallInput,
        );
    });
}

// ---------------------------------------------------------------------------
// Component storage
// ---------------------------------------------------------------------------

fn bench_storage_iteration(c: &mut Criterion) {
    let mut world = World::new();
    world.register_component::<Transform>();
    for i in 0..10_000 {
        let entity = world.spawn();
        world
            .insert(entity, Transform::from_translation(Vec3::new(i as f32, 0.0, 0.0)))
            .unwrap();
    }
    c.bench_function("iterate_10k_transforms", |b| {
        b.iter(|| {
            let transforms = world.read::<Transform>().unwrap();
            let mut sum = 0.0f32;
            for (_, transform) in transforms.iter() {
                sum += transform.translation.x;
            }
            black_box(sum)
        });
    });
}

// ---------------------------------------------------------------------------
// Transform propagation
// ---------------------------------------------------------------------------

fn deep_hierarchy_world(width: usize, depth: usize) -> World {
    let mut world = World::new();
    silkweed_ecs::register_engine_components(&mut world);
    for _ in 0..width {
        let mut parent = world.spawn();
        world.insert(parent, Transform::identity()).unwrap();
        world.insert(parent, GlobalTransform::identity()).unwrap();
        for level in 1..depth {
            let child = world.spawn();
            world
                .insert(child, Transform::from_translation(Vec3::new(0.0, level as f32, 0.0)))
                .unwrap();
            world.insert(child, GlobalTransform::identity()).unwrap();
            set_parent(&mut world, child, parent);
            parent = child;
        }
    }
    world
}

fn bench_transform_propagation(c: &mut Criterion) {
    let world = deep_hierarchy_world(100, 10);
    c.bench_function("propagate_100x10_hierarchy", |b| {
        b.iter(|| update_world_transforms(black_box(&world)));
    });
}

// ---------------------------------------------------------------------------
// Full tick
// ---------------------------------------------------------------------------

fn bench_engine_tick(c: &mut Criterion) {
    let mut world = World::new();
    silkweed_ecs::register_engine_components(&mut world);
    for i in 0..1_000 {
        let entity = world.spawn();
        world
            .insert(entity, Transform::from_translation(Vec3::new(i as f32, 0.0, 0.0)))
            .unwrap();
        world.insert(entity, GlobalTransform::identity()).unwrap();
        world
            .insert(entity, Velocity::linear(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();
    }
    let mut engine = Engine::builder().world(world).build().unwrap();
    engine.start().unwrap();
    c.bench_function("tick_1k_kinematic_entities", |b| {
        b.iter(|| engine.tick().unwrap());
    });
}

criterion_group!(
    benches,
    bench_spawn_entities_1k,
    bench_spawn_despawn_churn,
    bench_storage_iteration,
    bench_transform_propagation,
    bench_engine_tick
);
criterion_main!(benches);
