//! C API for handles and managed strings

use std::ffi::c_char;

use graphrt_core::strings::from_native;
use graphrt_core::{handle, Encoding, Error, NativeString};

use crate::types::{grt_handle, grt_thread};
use crate::{register, require, resolve, run, write_out, StatusCode};

/// Destroy a handle.
///
/// The object is released once no other handle or iterator refers to it.
/// Destroying the same handle twice fails with `GRT_STATUS_INVALID_HANDLE`.
/// Two threads must not destroy the same handle concurrently.
#[unsafe(no_mangle)]
pub extern "C" fn grt_handles_destroy(thread: *const grt_thread, handle: grt_handle) -> StatusCode {
    run(thread, || handle::global().destroy(handle))
}

/// Whether a handle is live (1) or not (0).
#[unsafe(no_mangle)]
pub extern "C" fn grt_handles_is_valid(
    thread: *const grt_thread,
    handle: grt_handle,
    out_valid: *mut libc::c_int,
) -> StatusCode {
    run(thread, || {
        write_out(out_valid, libc::c_int::from(handle::global().is_valid(handle)));
        Ok(())
    })
}

/// Number of live handles in the process.
#[unsafe(no_mangle)]
pub extern "C" fn grt_handles_count(
    thread: *const grt_thread,
    out_count: *mut libc::size_t,
) -> StatusCode {
    run(thread, || {
        write_out(out_count, handle::global().len());
        Ok(())
    })
}

/// Pointer to the NUL-terminated buffer of a string handle.
///
/// The buffer is in the encoding that was the default when the string was
/// created. It stays valid until the handle is destroyed.
#[unsafe(no_mangle)]
pub extern "C" fn grt_handles_get_ccharpointer(
    thread: *const grt_thread,
    handle: grt_handle,
    out_ptr: *mut *const c_char,
) -> StatusCode {
    run(thread, || {
        let string = resolve::<NativeString>(handle)?;
        write_out(out_ptr, string.as_ptr());
        Ok(())
    })
}

/// Copy a native string into a new string handle.
///
/// # Arguments
/// * `text` - NUL-terminated input
/// * `encoding` - Encoding of `text`: 0 = UTF-8, 1 = UTF-16, 2 = ISO-8859-1
/// * `out_string` - Output: string handle, pinned in the default encoding
#[unsafe(no_mangle)]
pub extern "C" fn grt_string_create(
    thread: *const grt_thread,
    text: *const c_char,
    encoding: libc::c_int,
    out_string: *mut grt_handle,
) -> StatusCode {
    run(thread, || {
        let encoding = Encoding::from_code(encoding)
            .ok_or_else(|| Error::IllegalArgument(format!("unknown encoding code {encoding}")))?;
        let text = unsafe { from_native(text, encoding) }?;
        let handle = register(NativeString::new(&text)?)?;
        write_out(out_string, handle);
        Ok(())
    })
}

/// Length in bytes of a string handle's buffer, excluding the terminator.
#[unsafe(no_mangle)]
pub extern "C" fn grt_string_length(
    thread: *const grt_thread,
    handle: grt_handle,
    out_len: *mut libc::size_t,
) -> StatusCode {
    run(thread, || {
        require(out_len, "out_len")?;
        let string = resolve::<NativeString>(handle)?;
        write_out(out_len, string.len());
        Ok(())
    })
}
