//! Sparse-set component storage with runtime-checked borrows.
//!
//! Components live in dense arrays indexed through a per-entity sparse table,
//! so iteration touches contiguous memory and removal is a swap. Each storage
//! sits behind its own lock; borrows are checked at runtime the way `RefCell`
//! checks them, with a panic naming the component on a conflict.

use std::any::{self, Any};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Dense storage for one component type, indexed by entity slot.
pub struct SparseSet<T: 'static> {
    sparse: Vec<Option<u32>>,
    dense: Vec<T>,
    entities: Vec<u32>,
}

impl<T: 'static> SparseSet<T> {
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Insert or replace the component at entity slot `index`.
    ///
    /// Returns the previous value when replacing.
    pub fn insert(&mut self, index: u32, value: T) -> Option<T> {
        let slot = index as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }
        match self.sparse[slot] {
            Some(dense_index) => {
                Some(std::mem::replace(&mut self.dense[dense_index as usize], value))
            }
            None => {
                self.sparse[slot] = Some(self.dense.len() as u32);
                self.dense.push(value);
                self.entities.push(index);
                None
            }
        }
    }

    /// Remove the component at `index` by swapping in the last dense element.
    pub fn remove(&mut self, index: u32) -> Option<T> {
        let slot = index as usize;
        let dense_index = self.sparse.get_mut(slot)?.take()? as usize;
        let value = self.dense.swap_remove(dense_index);
        self.entities.swap_remove(dense_index);
        if dense_index < self.dense.len() {
            // Patch the sparse entry of the element that was swapped in.
            let moved = self.entities[dense_index] as usize;
            self.sparse[moved] = Some(dense_index as u32);
        }
        Some(value)
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        let dense_index = (*self.sparse.get(index as usize)?)? as usize;
        Some(&self.dense[dense_index])
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        let dense_index = (*self.sparse.get(index as usize)?)? as usize;
        Some(&mut self.dense[dense_index])
    }

    pub fn contains(&self, index: u32) -> bool {
        matches!(self.sparse.get(index as usize), Some(Some(_)))
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Iterate `(entity slot, component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Entity slots that currently hold this component, in dense order.
    pub fn entities(&self) -> &[u32] {
        &self.entities
    }
}

impl<T: 'static> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared borrow of a component storage. Derefs to [`SparseSet`].
pub struct Ref<'a, T: 'static> {
    guard: RwLockReadGuard<'a, SparseSet<T>>,
}

impl<T: 'static> std::ops::Deref for Ref<'_, T> {
    type Target = SparseSet<T>;

    fn deref(&self) -> &SparseSet<T> {
        &self.guard
    }
}

/// Exclusive borrow of a component storage. Derefs to [`SparseSet`].
pub struct RefMut<'a, T: 'static> {
    guard: RwLockWriteGuard<'a, SparseSet<T>>,
}

impl<T: 'static> std::ops::Deref for RefMut<'_, T> {
    type Target = SparseSet<T>;

    fn deref(&self) -> &SparseSet<T> {
        &self.guard
    }
}

impl<T: 'static> std::ops::DerefMut for RefMut<'_, T> {
    fn deref_mut(&mut self) -> &mut SparseSet<T> {
        &mut self.guard
    }
}

/// Type-erased storage entry held by the world.
///
/// The erased box contains an `RwLock<SparseSet<T>>`; the function pointers
/// captured at registration time recover `T` for operations that must work
/// without knowing the component type, such as despawn.
pub(crate) struct ComponentStorage {
    inner: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
    remove_fn: fn(&dyn Any, u32) -> bool,
    contains_fn: fn(&dyn Any, u32) -> bool,
}

impl ComponentStorage {
    pub fn new<T: Send + Sync + 'static>() -> Self {
        Self {
            inner: Box::new(RwLock::new(SparseSet::<T>::new())),
            type_name: any::type_name::<T>(),
            remove_fn: |inner, index| match inner.downcast_ref::<RwLock<SparseSet<T>>>() {
                Some(lock) => match lock.try_write() {
                    Ok(mut set) => set.remove(index).is_some(),
                    Err(_) => panic!(
                        "Cannot remove `{}` component: storage is borrowed",
                        any::type_name::<T>()
                    ),
                },
                None => false,
            },
            contains_fn: |inner, index| match inner.downcast_ref::<RwLock<SparseSet<T>>>() {
                Some(lock) => match lock.try_read() {
                    Ok(set) => set.contains(index),
                    Err(_) => panic!(
                        "Cannot inspect `{}` component: storage is borrowed mutably",
                        any::type_name::<T>()
                    ),
                },
                None => false,
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn lock<T: 'static>(&self) -> Option<&RwLock<SparseSet<T>>> {
        self.inner.downcast_ref()
    }

    /// Borrow the typed set for reading.
    ///
    /// Returns `None` when `T` does not match this storage.
    ///
    /// # Panics
    ///
    /// Panics if the storage is currently borrowed mutably.
    pub fn read<T: 'static>(&self) -> Option<Ref<'_, T>> {
        let lock = self.lock::<T>()?;
        match lock.try_read() {
            Ok(guard) => Some(Ref { guard }),
            Err(_) => panic!(
                "Cannot borrow `{}` immutably: already borrowed mutably",
                self.type_name
            ),
        }
    }

    /// Borrow the typed set for writing.
    ///
    /// # Panics
    ///
    /// Panics if the storage is currently borrowed in any way.
    pub fn write<T: 'static>(&self) -> Option<RefMut<'_, T>> {
        let lock = self.lock::<T>()?;
        match lock.try_write() {
            Ok(guard) => Some(RefMut { guard }),
            Err(_) => panic!(
                "Cannot borrow `{}` mutably: already borrowed",
                self.type_name
            ),
        }
    }

    /// Direct access through exclusive ownership, bypassing the lock.
    pub fn set_mut<T: 'static>(&mut self) -> Option<&mut SparseSet<T>> {
        let lock = self.inner.downcast_mut::<RwLock<SparseSet<T>>>()?;
        Some(match lock.get_mut() {
            Ok(set) => set,
            Err(poisoned) => poisoned.into_inner(),
        })
    }

    /// Remove whatever component occupies `index`, without knowing its type.
    pub fn remove_untyped(&self, index: u32) -> bool {
        (self.remove_fn)(self.inner.as_ref(), index)
    }

    pub fn contains_untyped(&self, index: u32) -> bool {
        (self.contains_fn)(self.inner.as_ref(), index)
    }
}
