//! C API for key iterators
//!
//! Iterators keep their store alive and read it lazily, so keys added after
//! the iterator was created are visited if they land past its position.

use std::ffi::c_void;

use graphrt_core::{AttributeValue, Error, ExternalRef, Keys, NativeString, Result};

use crate::types::{grt_handle, grt_thread};
use crate::{register, resolve, run, write_out, StatusCode};

/// Key cursor behind an iterator handle.
pub(crate) enum KeyIterator {
    Attributes(Keys<i64, i64, String, AttributeValue>),
    StringRef(Keys<i64, i64, String, ExternalRef>),
    Any(Keys<ExternalRef, ExternalRef, ExternalRef, ExternalRef>),
}

fn exhausted() -> Error {
    Error::NoSuchElement("iterator has no more elements".into())
}

impl KeyIterator {
    fn has_next(&self) -> bool {
        match self {
            KeyIterator::Attributes(keys) => keys.has_next(),
            KeyIterator::StringRef(keys) => keys.has_next(),
            KeyIterator::Any(keys) => keys.has_next(),
        }
    }

    /// Advance and register the key as a string handle. The key is not
    /// consumed if the handle cannot be created.
    fn next_string(&self) -> Result<grt_handle> {
        let to_handle = |key: String| -> Result<grt_handle> { register(NativeString::new(&key)?) };
        match self {
            KeyIterator::Attributes(keys) => keys.try_next(to_handle).ok_or_else(exhausted)?,
            KeyIterator::StringRef(keys) => keys.try_next(to_handle).ok_or_else(exhausted)?,
            KeyIterator::Any(_) => Err(Error::TypeMismatch {
                expected: "string keys",
                found: "reference keys".into(),
            }),
        }
    }

    fn next_ref(&self) -> Result<ExternalRef> {
        match self {
            KeyIterator::Any(keys) => keys.next_key().ok_or_else(exhausted),
            KeyIterator::Attributes(_) | KeyIterator::StringRef(_) => Err(Error::TypeMismatch {
                expected: "reference keys",
                found: "string keys".into(),
            }),
        }
    }

    fn restart(&self) {
        match self {
            KeyIterator::Attributes(keys) => keys.restart(),
            KeyIterator::StringRef(keys) => keys.restart(),
            KeyIterator::Any(keys) => keys.restart(),
        }
    }
}

/// Whether the iterator has another element (1) or not (0).
#[unsafe(no_mangle)]
pub extern "C" fn grt_it_hasnext(
    thread: *const grt_thread,
    iterator: grt_handle,
    out_hasnext: *mut libc::c_int,
) -> StatusCode {
    run(thread, || {
        let it = resolve::<KeyIterator>(iterator)?;
        write_out(out_hasnext, libc::c_int::from(it.has_next()));
        Ok(())
    })
}

/// Advance a string-key iterator.
///
/// # Arguments
/// * `out_string` - Output: a new string handle; destroy it when done
///
/// # Returns
/// `GRT_STATUS_NO_SUCH_ELEMENT` past the end, `GRT_STATUS_CLASS_CAST` for a
/// reference-key iterator
#[unsafe(no_mangle)]
pub extern "C" fn grt_it_next_string(
    thread: *const grt_thread,
    iterator: grt_handle,
    out_string: *mut grt_handle,
) -> StatusCode {
    run(thread, || {
        let it = resolve::<KeyIterator>(iterator)?;
        write_out(out_string, it.next_string()?);
        Ok(())
    })
}

/// Advance a reference-key iterator.
///
/// # Arguments
/// * `out_ref` - Output: the caller pointer stored as the key
#[unsafe(no_mangle)]
pub extern "C" fn grt_it_next_ref(
    thread: *const grt_thread,
    iterator: grt_handle,
    out_ref: *mut *const c_void,
) -> StatusCode {
    run(thread, || {
        let it = resolve::<KeyIterator>(iterator)?;
        write_out(out_ref, it.next_ref()?.as_ptr());
        Ok(())
    })
}

/// Restart an iterator from the first key.
#[unsafe(no_mangle)]
pub extern "C" fn grt_it_reset(thread: *const grt_thread, iterator: grt_handle) -> StatusCode {
    run(thread, || {
        resolve::<KeyIterator>(iterator)?.restart();
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Attached;
    use crate::*;
    use std::ffi::{c_char, CStr, CString};

    fn collect_strings(t: &Attached, it: grt_handle) -> Vec<String> {
        let mut out = Vec::new();
        let mut has_next = 0;
        loop {
            assert_eq!(grt_it_hasnext(t.0, it, &mut has_next), GRT_STATUS_SUCCESS);
            if has_next == 0 {
                break;
            }
            let mut h: grt_handle = 0;
            assert_eq!(grt_it_next_string(t.0, it, &mut h), GRT_STATUS_SUCCESS);
            let mut ptr: *const c_char = std::ptr::null();
            grt_handles_get_ccharpointer(t.0, h, &mut ptr);
            out.push(unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_owned());
            grt_handles_destroy(t.0, h);
        }
        out
    }

    #[test]
    fn test_keys_in_insertion_order() {
        let t = Attached::new();
        let mut store: grt_handle = 0;
        grt_attrs_store_create(t.0, &mut store);
        let names: Vec<CString> = ["k1", "k2", "k3"]
            .iter()
            .map(|s| CString::new(*s).unwrap())
            .collect();
        for (i, name) in names.iter().enumerate() {
            grt_attrs_store_put_int(t.0, store, 0, 4, name.as_ptr(), i as libc::c_int);
        }

        let mut it: grt_handle = 0;
        assert_eq!(
            grt_attrs_store_keys_iterator(t.0, store, 0, 4, &mut it),
            GRT_STATUS_SUCCESS
        );
        // Dropping the store handle does not invalidate the iterator.
        grt_handles_destroy(t.0, store);
        assert_eq!(collect_strings(&t, it), vec!["k1", "k2", "k3"]);

        let mut h: grt_handle = 0;
        assert_eq!(grt_it_next_string(t.0, it, &mut h), GRT_STATUS_NO_SUCH_ELEMENT);
        assert_eq!(h, 0);

        let mut ptr: *const c_void = std::ptr::null();
        assert_eq!(grt_it_next_ref(t.0, it, &mut ptr), GRT_STATUS_CLASS_CAST);

        assert_eq!(grt_it_reset(t.0, it), GRT_STATUS_SUCCESS);
        assert_eq!(collect_strings(&t, it).len(), 3);
        grt_handles_destroy(t.0, it);
    }

    #[test]
    fn test_empty_element_iterator() {
        let t = Attached::new();
        let mut store: grt_handle = 0;
        grt_attrs_store_create(t.0, &mut store);
        let mut it: grt_handle = 0;
        grt_attrs_store_keys_iterator(t.0, store, 1, 77, &mut it);
        assert!(collect_strings(&t, it).is_empty());
        grt_handles_destroy(t.0, it);
        grt_handles_destroy(t.0, store);
    }

    #[test]
    fn test_non_iterator_handle() {
        let t = Attached::new();
        let mut store: grt_handle = 0;
        grt_attrs_store_create(t.0, &mut store);
        let mut has_next = 0;
        assert_eq!(grt_it_hasnext(t.0, store, &mut has_next), GRT_STATUS_CLASS_CAST);
        grt_handles_destroy(t.0, store);
    }
}
