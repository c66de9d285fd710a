//! C API for the attribute registry used by exporters

use std::ffi::c_char;

use graphrt_core::strings::{from_native_nullable, from_native_utf8};
use graphrt_core::{
    AttributeCategory, AttributeRegistry, AttributeType, Encoding, RegisteredAttribute, Result,
};

use crate::types::{grt_handle, grt_thread};
use crate::{register, resolve, run, write_out, StatusCode};

fn declaration(
    name: *const c_char,
    category: *const c_char,
    attr_type: *const c_char,
    default: *const c_char,
) -> Result<RegisteredAttribute> {
    let name = unsafe { from_native_utf8(name) }?;
    let category: AttributeCategory = unsafe { from_native_utf8(category) }?.parse()?;
    let attr_type: AttributeType = unsafe { from_native_utf8(attr_type) }?.parse()?;
    let default = unsafe { from_native_nullable(default, Encoding::Utf8) }?;
    RegisteredAttribute::new(name, category, attr_type, default)
}

/// Create an empty attribute registry.
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_registry_create(
    thread: *const grt_thread,
    out_registry: *mut grt_handle,
) -> StatusCode {
    run(thread, || {
        let handle = register(AttributeRegistry::new())?;
        write_out(out_registry, handle);
        Ok(())
    })
}

/// Declare an attribute.
///
/// # Arguments
/// * `name` - Attribute key
/// * `category` - `"graph"`, `"node"`, `"edge"` or `"all"`
/// * `attr_type` - `"boolean"`, `"int"`, `"long"`, `"float"`, `"double"` or `"string"`
/// * `default_value` - Default value text, or null for none
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_registry_register(
    thread: *const grt_thread,
    registry: grt_handle,
    name: *const c_char,
    category: *const c_char,
    attr_type: *const c_char,
    default_value: *const c_char,
) -> StatusCode {
    run(thread, || {
        let registry = resolve::<AttributeRegistry>(registry)?;
        registry.register(declaration(name, category, attr_type, default_value)?);
        Ok(())
    })
}

/// Remove the first declaration equal to the given one.
///
/// Fails with `GRT_STATUS_NO_SUCH_ELEMENT` if nothing matches.
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_registry_unregister(
    thread: *const grt_thread,
    registry: grt_handle,
    name: *const c_char,
    category: *const c_char,
    attr_type: *const c_char,
    default_value: *const c_char,
) -> StatusCode {
    run(thread, || {
        let registry = resolve::<AttributeRegistry>(registry)?;
        registry.unregister(&declaration(name, category, attr_type, default_value)?)
    })
}

/// Number of declared attributes.
#[unsafe(no_mangle)]
pub extern "C" fn grt_attrs_registry_size(
    thread: *const grt_thread,
    registry: grt_handle,
    out_size: *mut libc::size_t,
) -> StatusCode {
    run(thread, || {
        write_out(out_size, resolve::<AttributeRegistry>(registry)?.len());
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
    fn test_register_unregister() {
        let t = Attached::new();
        let mut registry: grt_handle = 0;
        assert_eq!(
            grt_attrs_registry_create(t.0, &mut registry),
            GRT_STATUS_SUCCESS
        );

        let name = CString::new("weight").unwrap();
        let edge = CString::new("edge").unwrap();
        let double = CString::new("double").unwrap();
        let one = CString::new("1.0").unwrap();

        let register = |default: *const c_char| {
            grt_attrs_registry_register(
                t.0,
                registry,
                name.as_ptr(),
                edge.as_ptr(),
                double.as_ptr(),
                default,
            )
        };
        assert_eq!(register(one.as_ptr()), GRT_STATUS_SUCCESS);
        assert_eq!(register(std::ptr::null()), GRT_STATUS_SUCCESS);

        let mut size = 0usize;
        grt_attrs_registry_size(t.0, registry, &mut size);
        assert_eq!(size, 2);

        let unregister = |default: *const c_char| {
            grt_attrs_registry_unregister(
                t.0,
                registry,
                name.as_ptr(),
                edge.as_ptr(),
                double.as_ptr(),
                default,
            )
        };
        assert_eq!(unregister(one.as_ptr()), GRT_STATUS_SUCCESS);
        assert_eq!(unregister(one.as_ptr()), GRT_STATUS_NO_SUCH_ELEMENT);
        assert_eq!(unregister(std::ptr::null()), GRT_STATUS_SUCCESS);

        grt_attrs_registry_size(t.0, registry, &mut size);
        assert_eq!(size, 0);
        grt_handles_destroy(t.0, registry);
    }

    #[test]
    fn test_rejects_unknown_category_and_type() {
        let t = Attached::new();
        let mut registry: grt_handle = 0;
        grt_attrs_registry_create(t.0, &mut registry);
        let name = CString::new("x").unwrap();
        let node = CString::new("node").unwrap();
        let face = CString::new("face").unwrap();
        let html = CString::new("html").unwrap();
        let int = CString::new("int").unwrap();

        let status = grt_attrs_registry_register(
            t.0,
            registry,
            name.as_ptr(),
            face.as_ptr(),
            int.as_ptr(),
            std::ptr::null(),
        );
        assert_eq!(status, GRT_STATUS_ILLEGAL_ARGUMENT);

        let status = grt_attrs_registry_register(
            t.0,
            registry,
            name.as_ptr(),
            node.as_ptr(),
            html.as_ptr(),
            std::ptr::null(),
        );
        assert_eq!(status, GRT_STATUS_ILLEGAL_ARGUMENT);

        let mut size = 9usize;
        grt_attrs_registry_size(t.0, registry, &mut size);
        assert_eq!(size, 0);
        grt_handles_destroy(t.0, registry);
    }
}
