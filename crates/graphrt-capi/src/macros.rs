//! Macros generating the typed accessors of the attributes store.

/// Generate `grt_attrs_store_put_<TYPE>` and `grt_attrs_store_get_<TYPE>`.
///
/// # Arguments
/// - `$type_name` - suffix of the generated functions
/// - `$in_ty` - C type accepted by `put`
/// - `$out_ty` - C type written by `get`
/// - `$to_value` - converts the `put` argument into an `AttributeValue`
/// - `$from_value` - converts a stored `AttributeValue` for `get`
///
/// # Example
/// ```ignore
/// impl_attrs_store_typed!(long, i64, i64, |v| Ok(AttributeValue::Long(v)), |a| a.as_long());
/// // Generates: grt_attrs_store_put_long, grt_attrs_store_get_long
/// ```
macro_rules! impl_attrs_store_typed {
    ($type_name:ident, $in_ty:ty, $out_ty:ty, $to_value:expr, $from_value:expr) => {
        paste::paste! {
            #[doc = concat!("Set a `", stringify!($type_name), "` attribute on an element.")]
            ///
            /// # Arguments
            /// * `store` - Attributes store handle
            /// * `kind` - Element kind (vertex, edge or graph)
            /// * `element` - Element id (ignored for the graph)
            /// * `key` - Attribute name (UTF-8)
            /// * `value` - New value
            #[unsafe(no_mangle)]
            pub extern "C" fn [<grt_attrs_store_put_ $type_name>](
                thread: *const $crate::types::grt_thread,
                store: $crate::types::grt_handle,
                kind: libc::c_int,
                element: i64,
                key: *const std::ffi::c_char,
                value: $in_ty,
            ) -> $crate::StatusCode {
                $crate::run(thread, || {
                    let to_value: fn($in_ty) -> graphrt_core::Result<graphrt_core::AttributeValue> =
                        $to_value;
                    let store = $crate::resolve::<graphrt_core::AttributesStore>(store)?;
                    let element = $crate::types::grt_element_kind::element(kind, element)?;
                    let key = unsafe { graphrt_core::strings::from_native_utf8(key) }?;
                    store.put(&element, key, to_value(value)?);
                    Ok(())
                })
            }

            #[doc = concat!("Read an attribute as `", stringify!($type_name), "`.")]
            ///
            /// Fails with `GRT_STATUS_MAP_NO_SUCH_KEY` if the key is not set,
            /// and with `GRT_STATUS_NUMBER_FORMAT_ERROR` or
            /// `GRT_STATUS_CLASS_CAST` if the value cannot be converted.
            #[unsafe(no_mangle)]
            pub extern "C" fn [<grt_attrs_store_get_ $type_name>](
                thread: *const $crate::types::grt_thread,
                store: $crate::types::grt_handle,
                kind: libc::c_int,
                element: i64,
                key: *const std::ffi::c_char,
                out_value: *mut $out_ty,
            ) -> $crate::StatusCode {
                $crate::run(thread, || {
                    let from_value: fn(
                        &graphrt_core::AttributeValue,
                    ) -> graphrt_core::Result<$out_ty> = $from_value;
                    let value = $crate::attrs_store::lookup(store, kind, element, key)?;
                    let converted = from_value(&value)?;
                    $crate::write_out(out_value, converted);
                    Ok(())
                })
            }
        }
    };
}
