//! C API for the reference-keyed, reference-valued store
//!
//! Elements, keys and values are all caller pointers. The store can compare
//! them by identity or through a caller-supplied hash and equality pair.

use std::ffi::c_void;
use std::sync::Arc;

use graphrt_core::{AnyStore, Element, Error, ExternalRef, RefEquivalence, RefFactory, Result};

use crate::iterators::KeyIterator;
use crate::types::{grt_element_kind, grt_equals_fn, grt_handle, grt_hash_fn, grt_thread};
use crate::{register, require, resolve, run, write_out, StatusCode};

/// Equivalence backed by C callbacks.
struct CallbackEquivalence {
    hash: grt_hash_fn,
    equals: grt_equals_fn,
}

impl RefEquivalence for CallbackEquivalence {
    fn hash(&self, addr: usize) -> u64 {
        (self.hash)(addr as *const c_void) as u64
    }

    fn equals(&self, a: usize, b: usize) -> bool {
        (self.equals)(a as *const c_void, b as *const c_void) != 0
    }
}

/// Store behind a `grt_any_store_*` handle, with the factory that wraps
/// every pointer it receives.
pub(crate) struct AnyStoreHandle {
    store: Arc<AnyStore>,
    refs: RefFactory,
}

impl AnyStoreHandle {
    fn element(
        &self,
        kind: libc::c_int,
        element: *const c_void,
    ) -> Result<Element<ExternalRef, ExternalRef>> {
        grt_element_kind::element(kind, self.refs.make(element))
    }
}

fn previous_ptr(previous: Option<ExternalRef>) -> *const c_void {
    previous.map_or(std::ptr::null(), |r| r.as_ptr())
}

/// Create an empty any store.
///
/// # Arguments
/// * `hash` - Hash function for references, or null for identity
/// * `equals` - Equality function for references, or null for identity
/// * `out_store` - Output: store handle
///
/// Supply both functions or neither; otherwise `GRT_STATUS_ILLEGAL_ARGUMENT`.
/// The pair must be consistent (equal references hash equally), must be
/// stable while the store holds references, and must not call back into the
/// store.
#[unsafe(no_mangle)]
pub extern "C" fn grt_any_store_create(
    thread: *const grt_thread,
    hash: Option<grt_hash_fn>,
    equals: Option<grt_equals_fn>,
    out_store: *mut grt_handle,
) -> StatusCode {
    run(thread, || {
        let refs = match (hash, equals) {
            (Some(hash), Some(equals)) => {
                RefFactory::with_strategy(Arc::new(CallbackEquivalence { hash, equals }))
            }
            (None, None) => RefFactory::identity(),
            _ => {
                return Err(Error::IllegalArgument(
                    "hash and equals must be supplied together".into(),
                ))
            }
        };
        let handle = register(AnyStoreHandle {
            store: Arc::new(AnyStore::new()),
            refs,
        })?;
        write_out(out_store, handle);
        Ok(())
    })
}

/// Associate `value` with `key` on an element.
///
/// # Arguments
/// * `out_previous` - Output (optional): previous value, or null
#[unsafe(no_mangle)]
pub extern "C" fn grt_any_store_put(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: *const c_void,
    key: *const c_void,
    value: *const c_void,
    out_previous: *mut *const c_void,
) -> StatusCode {
    run(thread, || {
        let h = resolve::<AnyStoreHandle>(store)?;
        let element = h.element(kind, element)?;
        let previous = h.store.put(&element, h.refs.make(key), h.refs.make(value));
        write_out(out_previous, previous_ptr(previous));
        Ok(())
    })
}

/// Value stored under `key`.
///
/// Fails with `GRT_STATUS_MAP_NO_SUCH_KEY` if the key is not set.
#[unsafe(no_mangle)]
pub extern "C" fn grt_any_store_get(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: *const c_void,
    key: *const c_void,
    out_value: *mut *const c_void,
) -> StatusCode {
    run(thread, || {
        let h = resolve::<AnyStoreHandle>(store)?;
        let element = h.element(kind, element)?;
        let value = h
            .store
            .get(&element, &h.refs.make(key))
            .ok_or_else(|| Error::MapNoSuchKey(format!("{key:p}")))?;
        write_out(out_value, value.as_ptr());
        Ok(())
    })
}

/// Whether `key` is set (1) or not (0).
#[unsafe(no_mangle)]
pub extern "C" fn grt_any_store_contains(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: *const c_void,
    key: *const c_void,
    out_contains: *mut libc::c_int,
) -> StatusCode {
    run(thread, || {
        let h = resolve::<AnyStoreHandle>(store)?;
        let element = h.element(kind, element)?;
        let contains = h.store.contains_key(&element, &h.refs.make(key));
        write_out(out_contains, libc::c_int::from(contains));
        Ok(())
    })
}

/// Remove `key` from an element.
///
/// # Arguments
/// * `out_previous` - Output (optional): removed value, or null if absent
#[unsafe(no_mangle)]
pub extern "C" fn grt_any_store_remove(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: *const c_void,
    key: *const c_void,
    out_previous: *mut *const c_void,
) -> StatusCode {
    run(thread, || {
        let h = resolve::<AnyStoreHandle>(store)?;
        let element = h.element(kind, element)?;
        let previous = h.store.remove(&element, &h.refs.make(key));
        write_out(out_previous, previous_ptr(previous));
        Ok(())
    })
}

/// Number of keys on an element.
#[unsafe(no_mangle)]
pub extern "C" fn grt_any_store_size(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: *const c_void,
    out_size: *mut libc::size_t,
) -> StatusCode {
    run(thread, || {
        let h = resolve::<AnyStoreHandle>(store)?;
        write_out(out_size, h.store.size(&h.element(kind, element)?));
        Ok(())
    })
}

/// Iterator over the keys of an element. Yields pointers via `grt_it_next_ref`.
#[unsafe(no_mangle)]
pub extern "C" fn grt_any_store_keys_iterator(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: *const c_void,
    out_iterator: *mut grt_handle,
) -> StatusCode {
    run(thread, || {
        require(out_iterator, "out_iterator")?;
        let h = resolve::<AnyStoreHandle>(store)?;
        let keys = h.store.keys(h.element(kind, element)?);
        let handle = register(KeyIterator::Any(keys))?;
        write_out(out_iterator, handle);
        Ok(())
    })
}

/// Remove every key of an element.
#[unsafe(no_mangle)]
pub extern "C" fn grt_any_store_clear(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: *const c_void,
) -> StatusCode {
    run(thread, || {
        let h = resolve::<AnyStoreHandle>(store)?;
        h.store.clear(&h.element(kind, element)?);
        Ok(())
    })
}

/// Remove every key of every element.
#[unsafe(no_mangle)]
pub extern "C" fn grt_any_store_clear_all(
    thread: *const grt_thread,
    store: grt_handle,
) -> StatusCode {
    run(thread, || {
        resolve::<AnyStoreHandle>(store)?.store.clear_all();
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Attached;
    use crate::*;

    // Keys are pointers to i64; equal when the pointees are equal.
    extern "C" fn value_hash(ptr: *const c_void) -> i64 {
        unsafe { *(ptr as *const i64) }
    }

    extern "C" fn value_equals(a: *const c_void, b: *const c_void) -> libc::c_int {
        unsafe { libc::c_int::from(*(a as *const i64) == *(b as *const i64)) }
    }

    fn ptr(v: &i64) -> *const c_void {
        (v as *const i64).cast()
    }

    #[test]
    fn test_identity_store() {
        let t = Attached::new();
        let mut store: grt_handle = 0;
        assert_eq!(
            grt_any_store_create(t.0, None, None, &mut store),
            GRT_STATUS_SUCCESS
        );

        let (v, k1, k2, x, y) = (1i64, 7i64, 7i64, 10i64, 20i64);
        let mut prev: *const c_void = ptr(&v);
        grt_any_store_put(t.0, store, 0, ptr(&v), ptr(&k1), ptr(&x), &mut prev);
        assert!(prev.is_null());
        grt_any_store_put(t.0, store, 0, ptr(&v), ptr(&k1), ptr(&y), &mut prev);
        assert_eq!(prev, ptr(&x));

        // Equal pointees at another address are a different key.
        let mut contains = 1;
        grt_any_store_contains(t.0, store, 0, ptr(&v), ptr(&k2), &mut contains);
        assert_eq!(contains, 0);

        let mut out: *const c_void = std::ptr::null();
        let status = grt_any_store_get(t.0, store, 0, ptr(&v), ptr(&k2), &mut out);
        assert_eq!(status, GRT_STATUS_MAP_NO_SUCH_KEY);

        grt_any_store_remove(t.0, store, 0, ptr(&v), ptr(&k1), &mut prev);
        assert_eq!(prev, ptr(&y));
        grt_any_store_remove(t.0, store, 0, ptr(&v), ptr(&k1), &mut prev);
        assert!(prev.is_null());

        grt_handles_destroy(t.0, store);
    }

    #[test]
    fn test_callback_store() {
        let t = Attached::new();
        let mut store: grt_handle = 0;
        let status = grt_any_store_create(t.0, Some(value_hash), Some(value_equals), &mut store);
        assert_eq!(status, GRT_STATUS_SUCCESS);

        let (v1, v2, k1, k2, x) = (3i64, 3i64, 5i64, 5i64, 42i64);
        grt_any_store_put(t.0, store, 1, ptr(&v1), ptr(&k1), ptr(&x), std::ptr::null_mut());

        let mut out: *const c_void = std::ptr::null();
        let status = grt_any_store_get(t.0, store, 1, ptr(&v2), ptr(&k2), &mut out);
        assert_eq!(status, GRT_STATUS_SUCCESS);
        assert_eq!(out, ptr(&x));

        let mut size = 0usize;
        grt_any_store_size(t.0, store, 1, ptr(&v2), &mut size);
        assert_eq!(size, 1);

        let mut it: grt_handle = 0;
        grt_any_store_keys_iterator(t.0, store, 1, ptr(&v1), &mut it);
        let mut key: *const c_void = std::ptr::null();
        assert_eq!(grt_it_next_ref(t.0, it, &mut key), GRT_STATUS_SUCCESS);
        assert_eq!(key, ptr(&k1));
        let mut handle: grt_handle = 0;
        assert_eq!(
            grt_it_next_string(t.0, it, &mut handle),
            GRT_STATUS_CLASS_CAST
        );
        grt_handles_destroy(t.0, it);

        grt_any_store_clear(t.0, store, 1, ptr(&v2));
        grt_any_store_size(t.0, store, 1, ptr(&v1), &mut size);
        assert_eq!(size, 0);

        grt_handles_destroy(t.0, store);
    }

    #[test]
    fn test_graph_element_ignores_pointer() {
        let t = Attached::new();
        let mut store: grt_handle = 0;
        grt_any_store_create(t.0, None, None, &mut store);
        let (k, x) = (1i64, 2i64);
        grt_any_store_put(t.0, store, 2, std::ptr::null(), ptr(&k), ptr(&x), std::ptr::null_mut());

        let mut out: *const c_void = std::ptr::null();
        grt_any_store_get(t.0, store, 2, ptr(&x), ptr(&k), &mut out);
        assert_eq!(out, ptr(&x));

        grt_any_store_clear_all(t.0, store);
        let mut size = 1usize;
        grt_any_store_size(t.0, store, 2, std::ptr::null(), &mut size);
        assert_eq!(size, 0);
        grt_handles_destroy(t.0, store);
    }

    #[test]
    fn test_half_callback_pair_rejected() {
        let t = Attached::new();
        let mut store: grt_handle = 0;
        let status = grt_any_store_create(t.0, Some(value_hash), None, &mut store);
        assert_eq!(status, GRT_STATUS_ILLEGAL_ARGUMENT);
        assert_eq!(store, 0);
    }
}
