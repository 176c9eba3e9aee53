//! GPU resource entries and their lifecycle.
//!
//! Every GPU-backed resource (texture, mesh, shader program, material,
//! render target) is wrapped in an entry that tracks where the resource is
//! in its life:
//!
//! - `Created`: registered, nothing loaded or uploaded yet
//! - `Loading`: asset bytes are being read and decoded off-thread
//! - `Uploading`: an upload action is queued or running on the render thread
//! - `Using`: a live GPU handle exists and can be bound
//! - `Outdated`: the GPU copy no longer matches the source and will be
//!   re-uploaded before the resource is next used
//!
//! Entries are shared between the logical thread, loader threads and the
//! render thread via `Arc`, so the state lives in an atomic and every
//! transition is a compare-and-swap. A failed transition means another
//! thread got there first, never a torn state.
//!
//! While a new GPU object is being created, the previous one stays bindable
//! through [`DoubleBuffered`]: uploads fill the back slot and flip the live
//! index, and the retired handle is deleted on the render thread.

mod material;
mod mesh;
mod render_target;
mod shader;
mod texture;
mod upload;

pub use material::{MaterialDesc, MaterialEntry};
pub use mesh::MeshEntry;
pub use render_target::RenderTargetEntry;
pub use shader::{
    ShaderEntry, ShaderSources, forward_fragment_source, forward_sources, forward_vertex_source,
};
pub use texture::TextureEntry;
pub use upload::{AnyEntry, UploadQueue, request_upload};

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};

use parking_lot::Mutex;

// ============================================================================
// EntryState
// ============================================================================

/// Lifecycle state of a GPU resource entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntryState {
    /// Registered, no data loaded yet.
    Created = 0,
    /// Source data is being read and decoded off-thread.
    Loading = 1,
    /// An upload action is queued for or running on the render thread.
    Uploading = 2,
    /// A live GPU handle exists.
    Using = 3,
    /// The GPU copy is stale and will be re-uploaded before next use.
    Outdated = 4,
}

impl EntryState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Created,
            1 => Self::Loading,
            2 => Self::Uploading,
            3 => Self::Using,
            4 => Self::Outdated,
            other => {
                debug_assert!(false, "invalid entry state {other}");
                Self::Created
            }
        }
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: EntryState) -> bool {
        use EntryState::*;
        matches!(
            (self, next),
            (Created, Loading)
                | (Created, Uploading)
                | (Loading, Uploading)
                | (Uploading, Using)
                | (Using, Outdated)
                | (Outdated, Uploading)
        )
    }

    /// Whether the entry's content has reached the GPU.
    ///
    /// `Outdated` counts: the previous upload stays live while the
    /// replacement is pending.
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Using | Self::Outdated)
    }
}

// ============================================================================
// EntryCore
// ============================================================================

/// Shared lifecycle bookkeeping embedded in every entry type.
pub struct EntryCore {
    label: String,
    state: AtomicU8,
    generation: AtomicU64,
    uploaded_generation: AtomicU64,
    failed: AtomicBool,
}

impl EntryCore {
    /// Create a core in the `Created` state.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: AtomicU8::new(EntryState::Created as u8),
            generation: AtomicU64::new(1),
            uploaded_generation: AtomicU64::new(0),
            failed: AtomicBool::new(false),
        }
    }

    /// Human-readable identity, used in log messages.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EntryState {
        EntryState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Atomically move from `from` to `to`.
    ///
    /// Returns false if the edge is illegal or another thread changed the
    /// state first. Illegal edges are logged; lost races are not, they are
    /// expected.
    pub fn try_transition(&self, from: EntryState, to: EntryState) -> bool {
        if !from.can_transition_to(to) {
            log::error!(
                "illegal state transition {from:?} -> {to:?} on '{}'",
                self.label
            );
            return false;
        }
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether the entry's content has reached the GPU and nothing failed.
    pub fn is_usable(&self) -> bool {
        self.state().is_usable() && !self.has_failed()
    }

    /// Record a new source data generation.
    ///
    /// Callers pair this with a `Using -> Outdated` transition attempt; if
    /// an upload is in flight the generation mismatch is caught when it
    /// finishes.
    pub fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Latest source data generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Generation currently on the GPU.
    pub fn uploaded_generation(&self) -> u64 {
        self.uploaded_generation.load(Ordering::Acquire)
    }

    pub(crate) fn set_uploaded_generation(&self, generation: u64) {
        self.uploaded_generation.store(generation, Ordering::Release);
    }

    /// Whether the source has changed since the last completed upload.
    pub fn is_stale(&self) -> bool {
        self.generation() != self.uploaded_generation()
    }

    /// Mark the entry permanently failed; consumers fall back to
    /// placeholders.
    pub fn mark_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }

    /// Whether loading or uploading failed.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for EntryCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryCore")
            .field("label", &self.label)
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("uploaded_generation", &self.uploaded_generation())
            .field("failed", &self.has_failed())
            .finish()
    }
}

// ============================================================================
// DoubleBuffered
// ============================================================================

/// Two-slot handle holder with an atomic live index.
///
/// Readers take the live handle; uploads write the back slot and flip the
/// index so the old handle can be deleted without ever leaving a window
/// where a reader sees a destroyed handle.
pub struct DoubleBuffered<H> {
    slots: [Mutex<Option<H>>; 2],
    live: AtomicUsize,
}

impl<H: Copy> DoubleBuffered<H> {
    /// Create with both slots empty.
    pub fn new() -> Self {
        Self {
            slots: [Mutex::new(None), Mutex::new(None)],
            live: AtomicUsize::new(0),
        }
    }

    /// Copy out the live handle, if any.
    pub fn live(&self) -> Option<H> {
        let index = self.live.load(Ordering::Acquire);
        *self.slots[index].lock()
    }

    /// Install a new handle: write the back slot and make it live.
    ///
    /// Returns the handles this displaced, which the caller must delete on
    /// the render thread. Normally that is just the previous live handle.
    pub fn publish(&self, handle: H) -> Vec<H> {
        let live = self.live.load(Ordering::Acquire);
        let back = 1 - live;
        let displaced_back = self.slots[back].lock().replace(handle);
        self.live.store(back, Ordering::Release);
        let displaced_live = self.slots[live].lock().take();
        displaced_back.into_iter().chain(displaced_live).collect()
    }
}

impl<H: Copy> Default for DoubleBuffered<H> {
    fn default() -> Self {
        Self::new()
    }
}
