//! World-global singleton storage.
//!
//! Resources are values keyed by type: settings, event channels, the doomed
//! entity list, shared render resources. Borrow rules are enforced at runtime
//! per resource, with a panic naming the type on a conflict.

use std::any::{self, Any, TypeId};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

struct ResourceEntry {
    // The box holds an RwLock<T>.
    inner: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Shared borrow of a resource.
pub struct ResourceRef<'a, T: 'static> {
    guard: RwLockReadGuard<'a, T>,
}

impl<T: 'static> std::ops::Deref for ResourceRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

/// Exclusive borrow of a resource.
pub struct ResourceRefMut<'a, T: 'static> {
    guard: RwLockWriteGuard<'a, T>,
}

impl<T: 'static> std::ops::Deref for ResourceRefMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T: 'static> std::ops::DerefMut for ResourceRefMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

#[derive(Default)]
pub(crate) struct Resources {
    entries: HashMap<TypeId, ResourceEntry>,
}

impl Resources {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert or replace the resource of type `T`.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.entries.insert(
            TypeId::of::<T>(),
            ResourceEntry {
                inner: Box::new(RwLock::new(value)),
                type_name: any::type_name::<T>(),
            },
        );
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        let entry = self.entries.remove(&TypeId::of::<T>())?;
        let lock = entry.inner.downcast::<RwLock<T>>().ok()?;
        Some(match lock.into_inner() {
            Ok(value) => value,
            Err(poisoned) => poisoned.into_inner(),
        })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Borrow the resource of type `T` for reading.
    ///
    /// # Panics
    ///
    /// Panics if the resource does not exist or is borrowed mutably.
    pub fn borrow<T: 'static>(&self) -> ResourceRef<'_, T> {
        let entry = self.entry::<T>();
        let Some(lock) = entry.inner.downcast_ref::<RwLock<T>>() else {
            panic!("Resource `{}` has an unexpected type", entry.type_name);
        };
        match lock.try_read() {
            Ok(guard) => ResourceRef { guard },
            Err(_) => panic!(
                "Cannot borrow resource `{}` immutably: already borrowed mutably",
                entry.type_name
            ),
        }
    }

    /// Borrow the resource of type `T` for writing.
    ///
    /// # Panics
    ///
    /// Panics if the resource does not exist or is already borrowed.
    pub fn borrow_mut<T: 'static>(&self) -> ResourceRefMut<'_, T> {
        let entry = self.entry::<T>();
        let Some(lock) = entry.inner.downcast_ref::<RwLock<T>>() else {
            panic!("Resource `{}` has an unexpected type", entry.type_name);
        };
        match lock.try_write() {
            Ok(guard) => ResourceRefMut { guard },
            Err(_) => panic!(
                "Cannot borrow resource `{}` mutably: already borrowed",
                entry.type_name
            ),
        }
    }

    /// Direct access through exclusive ownership, bypassing the lock.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        let entry = self.entries.get_mut(&TypeId::of::<T>())?;
        let lock = entry.inner.downcast_mut::<RwLock<T>>()?;
        Some(match lock.get_mut() {
            Ok(value) => value,
            Err(poisoned) => poisoned.into_inner(),
        })
    }

    fn entry<T: 'static>(&self) -> &ResourceEntry {
        match self.entries.get(&TypeId::of::<T>()) {
            Some(entry) => entry,
            None => panic!("Resource `{}` does not exist", any::type_name::<T>()),
        }
    }
}
