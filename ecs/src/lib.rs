//! # Silkweed ECS
//!
//! Entity-Component-System core and the fixed-timestep engine that drives it.
//!
//! ## Core Types
//!
//! - [`Entity`] — Lightweight generational entity identifier
//! - [`World`] — Central container owning entities, components, and resources
//! - [`Ref`] / [`RefMut`] — Borrow-checked access to component storages
//! - [`CommandBuffer`] — Structural changes deferred to the end of the tick
//! - [`Events`] — Double-buffered event channels visible for two ticks
//! - [`Parent`] / [`Children`] — Transform hierarchy links
//!
//! ## Simulation
//!
//! - [`Engine`] — Fixed-timestep driver with an explicit lifecycle
//! - [`Behavior`] — Per-entity game logic, the only mutation point for game code
//! - [`Transform`] / [`GlobalTransform`] — Local pose and its world-space product
//! - [`Velocity`] — Kinematic motion integrated every tick
//! - [`Physics`] — Backend trait stepped inside the tick, null by default
//!
//! The optional `rendering` feature adds the [`rendering`] module, which
//! snapshots the world into immutable frames for `silkweed-graphics`.
//!
//! See `DESIGN.md` at the repository root for architecture decisions.

mod commands;
mod components;
mod engine;
mod entity;
mod events;
mod hierarchy;
#[cfg(feature = "rendering")]
pub mod rendering;
mod resource;
mod sparse_set;
mod systems;
mod world;

pub use commands::{Command, CommandBuffer, SpawnBuilder};
pub use components::{Behave, Behavior, GlobalTransform, Transform, Velocity, run_behaviors};
pub use engine::{
    AudioListener, DEFAULT_QUEUE_BUDGET, DoomedBatches, Engine, EngineBuilder, EngineError,
    EngineState, EngineStateChanged, FragmentProvider, FrameHook, NullPhysics, Physics,
    register_engine_components,
};
pub use entity::Entity;
pub use events::Events;
pub use hierarchy::{
    Children, HierarchyCommands, Parent, despawn_recursive, remove_parent, set_parent,
};
pub use resource::{ResourceRef, ResourceRefMut};
pub use sparse_set::{Ref, RefMut, SparseSet};
pub use systems::{integrate_kinematics, propagate_entity_state, update_world_transforms};
pub use world::{ComponentNotRegistered, World};
