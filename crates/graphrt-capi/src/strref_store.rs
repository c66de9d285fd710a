//! C API for the string-keyed reference store
//!
//! Maps attribute names on integer elements to caller pointers. Values are
//! compared by identity and never dereferenced.

use std::ffi::{c_char, c_void};

use graphrt_core::strings::from_native_utf8;
use graphrt_core::{Element, Error, ExternalRef, Result, StringRefStore};

use crate::iterators::KeyIterator;
use crate::types::{grt_element_kind, grt_handle, grt_thread};
use crate::{register, require, resolve, run, write_out, StatusCode};

struct Target {
    store: std::sync::Arc<StringRefStore>,
    element: Element<i64, i64>,
    key: String,
}

fn target(
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    key: *const c_char,
) -> Result<Target> {
    Ok(Target {
        store: resolve::<StringRefStore>(store)?,
        element: grt_element_kind::element(kind, element)?,
        key: unsafe { from_native_utf8(key) }?,
    })
}

/// Create an empty string-keyed reference store.
#[unsafe(no_mangle)]
pub extern "C" fn grt_strref_store_create(
    thread: *const grt_thread,
    out_store: *mut grt_handle,
) -> StatusCode {
    run(thread, || {
        let handle = register(StringRefStore::new())?;
        write_out(out_store, handle);
        Ok(())
    })
}

/// Associate a caller pointer with a key.
#[unsafe(no_mangle)]
pub extern "C" fn grt_strref_store_put(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    key: *const c_char,
    value: *const c_void,
) -> StatusCode {
    run(thread, || {
        let Target {
            store,
            element,
            key,
        } = target(store, kind, element, key)?;
        store.put(&element, key, ExternalRef::identity(value));
        Ok(())
    })
}

/// Pointer stored under a key.
///
/// Fails with `GRT_STATUS_MAP_NO_SUCH_KEY` if the key is not set.
#[unsafe(no_mangle)]
pub extern "C" fn grt_strref_store_get(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    key: *const c_char,
    out_value: *mut *const c_void,
) -> StatusCode {
    run(thread, || {
        let t = target(store, kind, element, key)?;
        let value = t
            .store
            .get(&t.element, &t.key)
            .ok_or(Error::MapNoSuchKey(t.key))?;
        write_out(out_value, value.as_ptr());
        Ok(())
    })
}

/// Whether a key is set (1) or not (0).
#[unsafe(no_mangle)]
pub extern "C" fn grt_strref_store_contains(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    key: *const c_char,
    out_contains: *mut libc::c_int,
) -> StatusCode {
    run(thread, || {
        let t = target(store, kind, element, key)?;
        write_out(out_contains, libc::c_int::from(t.store.contains_key(&t.element, &t.key)));
        Ok(())
    })
}

/// Remove a key. Removing a missing key is not an error.
///
/// # Arguments
/// * `out_removed` - Output (optional): 1 if a value was removed, else 0
#[unsafe(no_mangle)]
pub extern "C" fn grt_strref_store_remove(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    key: *const c_char,
    out_removed: *mut libc::c_int,
) -> StatusCode {
    run(thread, || {
        let t = target(store, kind, element, key)?;
        let removed = t.store.remove(&t.element, &t.key).is_some();
        write_out(out_removed, libc::c_int::from(removed));
        Ok(())
    })
}

/// Number of keys on an element.
#[unsafe(no_mangle)]
pub extern "C" fn grt_strref_store_size(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    out_size: *mut libc::size_t,
) -> StatusCode {
    run(thread, || {
        let store = resolve::<StringRefStore>(store)?;
        let element = grt_element_kind::element(kind, element)?;
        write_out(out_size, store.size(&element));
        Ok(())
    })
}

/// Iterator over the keys of an element. Yields string handles.
#[unsafe(no_mangle)]
pub extern "C" fn grt_strref_store_keys_iterator(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    out_iterator: *mut grt_handle,
) -> StatusCode {
    run(thread, || {
        require(out_iterator, "out_iterator")?;
        let store = resolve::<StringRefStore>(store)?;
        let element = grt_element_kind::element(kind, element)?;
        let handle = register(KeyIterator::StringRef(store.keys(element)))?;
        write_out(out_iterator, handle);
        Ok(())
    })
}

/// Remove every key of an element.
#[unsafe(no_mangle)]
pub extern "C" fn grt_strref_store_clear(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
) -> StatusCode {
    run(thread, || {
        let store = resolve::<StringRefStore>(store)?;
        store.clear(&grt_element_kind::element(kind, element)?);
        Ok(())
    })
}

/// Remove every key of every element.
#[unsafe(no_mangle)]
pub extern "C" fn grt_strref_store_clear_all(
    thread: *const grt_thread,
    store: grt_handle,
) -> StatusCode {
    run(thread, || {
        resolve::<StringRefStore>(store)?.clear_all();
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Attached;
    use crate::*;
    use std::ffi::CString;

    #[test]
    fn test_put_get_remove() {
        let t = Attached::new();
        let mut store: grt_handle = 0;
        assert_eq!(grt_strref_store_create(t.0, &mut store), GRT_STATUS_SUCCESS);

        let payload = [1u8, 2, 3];
        let value: *const c_void = payload.as_ptr().cast();
        let key = CString::new("payload").unwrap();

        let status = grt_strref_store_put(t.0, store, 1, 8, key.as_ptr(), value);
        assert_eq!(status, GRT_STATUS_SUCCESS);

        let mut out: *const c_void = std::ptr::null();
        grt_strref_store_get(t.0, store, 1, 8, key.as_ptr(), &mut out);
        assert_eq!(out, value);

        let mut contains = 0;
        grt_strref_store_contains(t.0, store, 1, 8, key.as_ptr(), &mut contains);
        assert_eq!(contains, 1);
        grt_strref_store_contains(t.0, store, 0, 8, key.as_ptr(), &mut contains);
        assert_eq!(contains, 0);

        let mut removed = 0;
        grt_strref_store_remove(t.0, store, 1, 8, key.as_ptr(), &mut removed);
        assert_eq!(removed, 1);
        grt_strref_store_remove(t.0, store, 1, 8, key.as_ptr(), &mut removed);
        assert_eq!(removed, 0);

        let mut out: *const c_void = std::ptr::null();
        let status = grt_strref_store_get(t.0, store, 1, 8, key.as_ptr(), &mut out);
        assert_eq!(status, GRT_STATUS_MAP_NO_SUCH_KEY);
        assert!(out.is_null());

        grt_handles_destroy(t.0, store);
    }

    #[test]
    fn test_keys_and_clear() {
        let t = Attached::new();
        let mut store: grt_handle = 0;
        grt_strref_store_create(t.0, &mut store);
        let a = CString::new("a").unwrap();
        let b = CString::new("b").unwrap();
        grt_strref_store_put(t.0, store, 2, 0, a.as_ptr(), std::ptr::null());
        grt_strref_store_put(t.0, store, 2, 0, b.as_ptr(), std::ptr::null());

        let mut size = 0usize;
        grt_strref_store_size(t.0, store, 2, 0, &mut size);
        assert_eq!(size, 2);

        let mut it: grt_handle = 0;
        grt_strref_store_keys_iterator(t.0, store, 2, 0, &mut it);
        let mut has_next = 0;
        grt_it_hasnext(t.0, it, &mut has_next);
        assert_eq!(has_next, 1);
        grt_handles_destroy(t.0, it);

        grt_strref_store_clear(t.0, store, 2, 0);
        grt_strref_store_size(t.0, store, 2, 0, &mut size);
        assert_eq!(size, 0);

        grt_strref_store_put(t.0, store, 0, 4, a.as_ptr(), std::ptr::null());
        grt_strref_store_clear_all(t.0, store);
        grt_strref_store_size(t.0, store, 0, 4, &mut size);
        assert_eq!(size, 0);

        grt_handles_destroy(t.0, store);
    }

    #[test]
    fn test_wrong_store_type() {
        let t = Attached::new();
        let mut attrs: grt_handle = 0;
        grt_attrs_store_create(t.0, &mut attrs);
        let key = CString::new("k").unwrap();
        let status = grt_strref_store_put(t.0, attrs, 0, 1, key.as_ptr(), std::ptr::null());
        assert_eq!(status, GRT_STATUS_CLASS_CAST);
        grt_handles_destroy(t.0, attrs);
    }
}
