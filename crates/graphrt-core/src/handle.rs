//! Process-wide handle registry.
//!
//! Handles are 64-bit values packing a slot index and a generation counter:
//!
//! ```text
//! bits 63..32  generation
//! bits 31..0   slot index + 1   (0 is never issued)
//! ```
//!
//! Destroying a handle bumps the slot's generation before the slot is reused,
//! so a stale handle can never resolve to a newer object. A slot whose
//! generation is exhausted is retired instead of reused.
//!
//! Operations on distinct handles only contend when they hash to the same
//! shard of the slot table. Destroy takes the shard's write lock, so resolve
//! never observes a handle half-destroyed. Destroying the *same* handle from
//! two threads at once is a caller error: exactly one call succeeds, but the
//! caller cannot know which.

use std::any::{type_name, Any};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};

/// Raw handle value as seen by native code.
pub type RawHandle = u64;

/// Shared managed object stored in the registry.
pub type ManagedObject = Arc<dyn Any + Send + Sync>;

const INDEX_MASK: u64 = 0xffff_ffff;

struct Entry {
    type_name: &'static str,
    object: ManagedObject,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[inline]
fn encode(index: u32, generation: u32) -> RawHandle {
    (u64::from(generation) << 32) | (u64::from(index) + 1)
}

#[inline]
fn decode(handle: RawHandle) -> Option<(u32, u32)> {
    let low = handle & INDEX_MASK;
    if low == 0 {
        return None;
    }
    // low - 1 < 2^32 - 1, so both casts are lossless.
    Some(((low - 1) as u32, (handle >> 32) as u32))
}

/// Table mapping opaque handles to managed objects.
pub struct HandleRegistry {
    slots: DashMap<u32, Slot, FxBuildHasher>,
    free: SegQueue<u32>,
    next_index: AtomicU32,
    live: AtomicUsize,
    leak_warning: bool,
}

impl std::fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("live", &self.live.load(Ordering::Relaxed))
            .field("leak_warning", &self.leak_warning)
            .finish_non_exhaustive()
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleRegistry {
    /// Create a registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&RuntimeConfig::default())
    }

    /// Create a registry from a configuration.
    pub fn with_config(config: &RuntimeConfig) -> Self {
        Self {
            slots: DashMap::with_capacity_and_hasher(
                config.initial_handle_capacity,
                FxBuildHasher,
            ),
            free: SegQueue::new(),
            next_index: AtomicU32::new(0),
            live: AtomicUsize::new(0),
            leak_warning: config.leak_warning,
        }
    }

    fn allocate_index(&self) -> Result<u32> {
        if let Some(index) = self.free.pop() {
            return Ok(index);
        }
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        if index == u32::MAX {
            self.next_index.store(u32::MAX, Ordering::Relaxed);
            return Err(Error::Unsupported("handle table exhausted".into()));
        }
        Ok(index)
    }

    /// Register an object and return a fresh handle owning it.
    pub fn create<T: Any + Send + Sync>(&self, object: T) -> Result<RawHandle> {
        self.create_shared(Arc::new(object))
    }

    /// Register a shared object.
    ///
    /// The same object may be registered under several handles at once; each
    /// handle is destroyed independently.
    pub fn create_shared<T: Any + Send + Sync>(&self, object: Arc<T>) -> Result<RawHandle> {
        let index = self.allocate_index()?;
        let entry = Entry {
            type_name: type_name::<T>(),
            object,
        };
        let mut slot = self.slots.entry(index).or_insert(Slot {
            generation: 0,
            entry: None,
        });
        slot.entry = Some(entry);
        let handle = encode(index, slot.generation);
        drop(slot);

        self.live.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(handle, type_name = type_name::<T>(), "handle created");
        Ok(handle)
    }

    /// Resolve a handle to its object without checking the type.
    pub fn resolve_any(&self, handle: RawHandle) -> Result<(&'static str, ManagedObject)> {
        let (index, generation) = decode(handle).ok_or(Error::InvalidHandle(handle))?;
        let slot = self.slots.get(&index).ok_or(Error::InvalidHandle(handle))?;
        match &slot.entry {
            Some(entry) if slot.generation == generation => {
                Ok((entry.type_name, Arc::clone(&entry.object)))
            }
            _ => Err(Error::InvalidHandle(handle)),
        }
    }

    /// Resolve a handle to an object of type `T`.
    ///
    /// Fails with [`Error::InvalidHandle`] for an unknown or destroyed handle
    /// and with [`Error::TypeMismatch`] if the object has a different type.
    pub fn resolve<T: Any + Send + Sync>(&self, handle: RawHandle) -> Result<Arc<T>> {
        let (found, object) = self.resolve_any(handle)?;
        object.downcast::<T>().map_err(|_| Error::TypeMismatch {
            expected: type_name::<T>(),
            found: found.to_string(),
        })
    }

    /// Type name of the object behind a handle.
    pub fn type_name_of(&self, handle: RawHandle) -> Result<&'static str> {
        self.resolve_any(handle).map(|(name, _)| name)
    }

    /// Remove a handle. A second destroy of the same handle fails.
    pub fn destroy(&self, handle: RawHandle) -> Result<()> {
        let (index, generation) = decode(handle).ok_or(Error::InvalidHandle(handle))?;
        let mut slot = self
            .slots
            .get_mut(&index)
            .ok_or(Error::InvalidHandle(handle))?;
        if slot.generation != generation || slot.entry.is_none() {
            return Err(Error::InvalidHandle(handle));
        }
        let entry = slot.entry.take();
        let retired = slot.generation == u32::MAX;
        if !retired {
            slot.generation += 1;
        }
        drop(slot);

        if !retired {
            self.free.push(index);
        }
        self.live.fetch_sub(1, Ordering::Relaxed);
        if let Some(entry) = entry {
            tracing::trace!(handle, type_name = entry.type_name, "handle destroyed");
        }
        Ok(())
    }

    /// Returns `true` if the handle currently resolves.
    pub fn is_valid(&self, handle: RawHandle) -> bool {
        self.resolve_any(handle).is_ok()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Returns `true` if no handle is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy every live handle. Returns how many were released.
    pub fn teardown(&self) -> usize {
        let mut released = Vec::new();
        for mut slot in self.slots.iter_mut() {
            if let Some(entry) = slot.entry.take() {
                if slot.generation != u32::MAX {
                    slot.generation += 1;
                    self.free.push(*slot.key());
                }
                released.push(entry);
            }
        }
        let count = released.len();
        self.live.fetch_sub(count, Ordering::Relaxed);
        drop(released);
        tracing::debug!(count, "handle registry torn down");
        count
    }
}

impl Drop for HandleRegistry {
    fn drop(&mut self) {
        let live = self.len();
        if live > 0 && self.leak_warning {
            tracing::warn!(live, "handle registry dropped with live handles");
        }
    }
}

static GLOBAL: OnceLock<HandleRegistry> = OnceLock::new();

/// The process-wide registry used by the C entry points.
///
/// Created with [`RuntimeConfig::default`] unless [`install_global`] ran
/// first.
pub fn global() -> &'static HandleRegistry {
    GLOBAL.get_or_init(HandleRegistry::new)
}

/// Create the process-wide registry from `config` and install its default
/// string encoding.
///
/// # Errors
///
/// Returns [`Error::Unsupported`] if the registry already exists, either
/// from an earlier install or from a call to [`global`]. The default
/// encoding is left untouched in that case.
pub fn install_global(config: &RuntimeConfig) -> Result<&'static HandleRegistry> {
    let mut installed = false;
    let registry = GLOBAL.get_or_init(|| {
        installed = true;
        HandleRegistry::with_config(config)
    });
    if !installed {
        return Err(Error::Unsupported(
            "handle registry is already initialized".to_string(),
        ));
    }
    config.apply_global();
    tracing::debug!(
        capacity = config.initial_handle_capacity,
        encoding = ?config.default_encoding,
        "installed global handle registry"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_never_issued() {
        let registry = HandleRegistry::new();
        let h = registry.create(1u32).unwrap();
        assert_ne!(h, 0);
        assert!(!registry.is_valid(0));
        assert!(matches!(registry.destroy(0), Err(Error::InvalidHandle(0))));
    }

    #[test]
    fn test_create_resolve_destroy() {
        let registry = HandleRegistry::new();
        let h = registry.create(String::from("graph")).unwrap();
        assert_eq!(*registry.resolve::<String>(h).unwrap(), "graph");
        assert_eq!(registry.len(), 1);

        registry.destroy(h).unwrap();
        assert!(matches!(
            registry.resolve::<String>(h),
            Err(Error::InvalidHandle(_))
        ));
        assert!(matches!(registry.destroy(h), Err(Error::InvalidHandle(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reused_slot_does_not_alias() {
        let registry = HandleRegistry::new();
        let first = registry.create(1i64).unwrap();
        registry.destroy(first).unwrap();

        let second = registry.create(2i64).unwrap();
        assert_eq!(first & INDEX_MASK, second & INDEX_MASK);
        assert_ne!(first, second);
        assert!(!registry.is_valid(first));
        assert_eq!(*registry.resolve::<i64>(second).unwrap(), 2);
    }

    #[test]
    fn test_wrong_type_is_class_cast() {
        let registry = HandleRegistry::new();
        let h = registry.create(5u8).unwrap();
        let err = registry.resolve::<String>(h).unwrap_err();
        assert_eq!(err.status(), crate::Status::ClassCast);
        assert_eq!(registry.type_name_of(h).unwrap(), "u8");
    }

    #[test]
    fn test_aliasing_shared_object() {
        let registry = HandleRegistry::new();
        let shared = Arc::new(vec![1, 2, 3]);
        let a = registry.create_shared(Arc::clone(&shared)).unwrap();
        let b = registry.create_shared(Arc::clone(&shared)).unwrap();
        assert_ne!(a, b);

        registry.destroy(a).unwrap();
        assert_eq!(*registry.resolve::<Vec<i32>>(b).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_never_issued_handle() {
        let registry = HandleRegistry::new();
        let err = registry.resolve_any(999_999).unwrap_err();
        assert!(matches!(err, Error::InvalidHandle(999_999)));
        assert!(!err.message().is_empty());
    }

    #[test]
    fn test_retired_slot_is_not_reused() {
        let registry = HandleRegistry::new();
        let h = registry.create(0u8).unwrap();
        registry.slots.get_mut(&0).unwrap().generation = u32::MAX;
        let exhausted = encode(0, u32::MAX);
        registry.destroy(exhausted).unwrap();
        assert!(registry.free.is_empty());

        let next = registry.create(1u8).unwrap();
        assert_ne!(next & INDEX_MASK, h & INDEX_MASK);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let registry = HandleRegistry::new();
        let object = Arc::new(String::from("x"));
        let handles: Vec<_> = (0..4)
            .map(|_| registry.create_shared(Arc::clone(&object)).unwrap())
            .collect();
        assert_eq!(Arc::strong_count(&object), 5);

        assert_eq!(registry.teardown(), 4);
        assert_eq!(Arc::strong_count(&object), 1);
        assert!(registry.is_empty());
        for h in handles {
            assert!(!registry.is_valid(h));
        }
    }
}
