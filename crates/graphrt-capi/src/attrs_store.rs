//! C API for the typed attributes store
//!
//! String-keyed, typed attributes on integer element ids. Exporters read
//! these back through the key iterators and typed getters.

use std::ffi::c_char;

use graphrt_core::strings::{from_native, from_native_utf8};
use graphrt_core::{
    AttributeType, AttributeValue, AttributesStore, Encoding, Error, NativeString, Result,
};

use crate::iterators::KeyIterator;
use crate::types::{grt_element_kind, grt_handle, grt_thread};
use crate::{register, require, resolve, run, write_out, StatusCode};

/// Value under `key`, or `MapNoSuchKey`.
pub(crate) fn lookup(
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    key: *const c_char,
) -> Result<AttributeValue> {
    let store = resolve::<AttributesStore>(store)?;
    let element = grt_element_kind::element(kind, element)?;
    let key = unsafe { from_native_utf8(key) }?;
    store
        .get(&element, &key)
        .ok_or(Error::MapNoSuchKey(key))
}

fn string_handle(value: &AttributeValue) -> Result<grt_handle> {
    register(NativeString::new(&value.as_string())?)
}

impl_attrs_store_typed!(
    boolean,
    libc::c_int,
    libc::c_int,
    |v| Ok(AttributeValue::Boolean(v != 0)),
    |a| a.as_bool().map(libc::c_int::from)
);
impl_attrs_store_typed!(
    int,
    libc::c_int,
    libc::c_int,
    |v| Ok(AttributeValue::Int(v)),
    |a| a.as_int()
);
impl_attrs_store_typed!(
    long,
    i64,
    i64,
    |v| Ok(AttributeValue::Long(v)),
    |a| a.as_long()
);
impl_attrs_store_typed!(
    double,
    libc::c_double,
    libc::c_double,
    |v| Ok(AttributeValue::Double(v)),
    |a| a.as_double()
);
impl_attrs_store_typed!(
    string,
    *const c_char,
    grt_handle,
    |v| unsafe { from_native(v, Encoding::Utf8) }.map(AttributeValue::String),
    string_handle
);

/// Create an empty attributes store.
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_store_create(
    thread: *const grt_thread,
    out_store: *mut grt_handle,
) -> StatusCode {
    run(thread, || {
        let handle = register(AttributesStore::new())?;
        write_out(out_store, handle);
        Ok(())
    })
}

/// Set an attribute from its type code and text form.
///
/// Covers every attribute type, including html, unknown and identifier.
///
/// # Arguments
/// * `value_type` - Attribute type code (0 = null ... 9 = identifier)
/// * `text` - Value text (UTF-8); ignored for null
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_store_put_typed(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    key: *const c_char,
    value_type: libc::c_int,
    text: *const c_char,
) -> StatusCode {
    run(thread, || {
        let store = resolve::<AttributesStore>(store)?;
        let element = grt_element_kind::element(kind, element)?;
        let key = unsafe { from_native_utf8(key) }?;
        let value_type = AttributeType::from_code(value_type).ok_or_else(|| {
            Error::IllegalArgument(format!("unknown attribute type {value_type}"))
        })?;
        let value = match value_type {
            AttributeType::Null => AttributeValue::Null,
            other => AttributeValue::parse(other, &unsafe { from_native_utf8(text) }?)?,
        };
        store.put(&element, key, value);
        Ok(())
    })
}

/// Type code of an attribute.
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_store_get_type(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    key: *const c_char,
    out_type: *mut libc::c_int,
) -> StatusCode {
    run(thread, || {
        let value = lookup(store, kind, element, key)?;
        write_out(out_type, value.value_type().code());
        Ok(())
    })
}

/// Whether an attribute is set (1) or not (0).
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_store_contains(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    key: *const c_char,
    out_contains: *mut libc::c_int,
) -> StatusCode {
    run(thread, || {
        let store = resolve::<AttributesStore>(store)?;
        let element = grt_element_kind::element(kind, element)?;
        let key = unsafe { from_native_utf8(key) }?;
        write_out(out_contains, libc::c_int::from(store.contains_key(&element, &key)));
        Ok(())
    })
}

/// Remove an attribute. Removing a missing key is not an error.
///
/// # Arguments
/// * `out_removed` - Output (optional): 1 if a value was removed, else 0
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_store_remove(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    key: *const c_char,
    out_removed: *mut libc::c_int,
) -> StatusCode {
    run(thread, || {
        let store = resolve::<AttributesStore>(store)?;
        let element = grt_element_kind::element(kind, element)?;
        let key = unsafe { from_native_utf8(key) }?;
        let removed = store.remove(&element, &key).is_some();
        write_out(out_removed, libc::c_int::from(removed));
        Ok(())
    })
}

/// Number of attributes on an element.
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_store_size(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    out_size: *mut libc::size_t,
) -> StatusCode {
    run(thread, || {
        let store = resolve::<AttributesStore>(store)?;
        let element = grt_element_kind::element(kind, element)?;
        write_out(out_size, store.size(&element));
        Ok(())
    })
}

/// Iterator over the attribute names of an element, in insertion order.
///
/// Yields string handles via `grt_it_next_string`.
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_store_keys_iterator(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
    out_iterator: *mut grt_handle,
) -> StatusCode {
    run(thread, || {
        require(out_iterator, "out_iterator")?;
        let store = resolve::<AttributesStore>(store)?;
        let element = grt_element_kind::element(kind, element)?;
        let handle = register(KeyIterator::Attributes(store.keys(element)))?;
        write_out(out_iterator, handle);
        Ok(())
    })
}

/// Remove every attribute of an element.
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_store_clear(
    thread: *const grt_thread,
    store: grt_handle,
    kind: libc::c_int,
    element: i64,
) -> StatusCode {
    run(thread, || {
        let store = resolve::<AttributesStore>(store)?;
        store.clear(&grt_element_kind::element(kind, element)?);
        Ok(())
    })
}

/// Remove every attribute of every element.
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_store_clear_all(
    thread: *const grt_thread,
    store: grt_handle,
) -> StatusCode {
    run(thread, || {
        resolve::<AttributesStore>(store)?.clear_all();
        Ok(())
    })
}
