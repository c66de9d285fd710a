//! Thread contexts and error accessors.
//!
//! The accessors read the channel without resetting it, so they can be
//! called any number of times after a failed call.

use std::ffi::{c_char, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};

use graphrt_core::{Status, ThreadContext, DEFAULT_ENCODING};

use crate::types::grt_thread;
use crate::{
    StatusCode, GRT_STATUS_ERROR, GRT_STATUS_ILLEGAL_ARGUMENT, GRT_STATUS_NULL_POINTER,
    GRT_STATUS_SUCCESS,
};

fn owned_context<'a>(thread: *const grt_thread) -> Result<&'a ThreadContext, StatusCode> {
    if thread.is_null() {
        return Err(GRT_STATUS_NULL_POINTER);
    }
    let ctx = unsafe { &*thread }.inner();
    if ctx.is_current_thread() {
        Ok(ctx)
    } else {
        Err(GRT_STATUS_ILLEGAL_ARGUMENT)
    }
}

/// Register the calling thread.
///
/// # Arguments
/// * `out_thread` - Output: the new context; release with `grt_thread_detach`
///
/// # Returns
/// Status code
#[unsafe(no_mangle)]
pub extern "C" fn grt_thread_attach(out_thread: *mut *mut grt_thread) -> StatusCode {
    if out_thread.is_null() {
        return GRT_STATUS_NULL_POINTER;
    }

    let result = catch_unwind(AssertUnwindSafe(|| {
        Box::into_raw(Box::new(grt_thread::new(ThreadContext::attach())))
    }));

    match result {
        Ok(ptr) => {
            unsafe { *out_thread = ptr };
            GRT_STATUS_SUCCESS
        }
        Err(_) => GRT_STATUS_ERROR,
    }
}

/// Release a thread context. Must be called on the thread that created it.
#[unsafe(no_mangle)]
pub extern "C" fn grt_thread_detach(thread: *mut grt_thread) -> StatusCode {
    if let Err(code) = owned_context(thread) {
        return code;
    }
    unsafe {
        let _ = Box::from_raw(thread);
    }
    GRT_STATUS_SUCCESS
}

/// Status of the last call on this context.
#[unsafe(no_mangle)]
pub extern "C" fn grt_get_errno(thread: *const grt_thread) -> StatusCode {
    match owned_context(thread) {
        Ok(ctx) => ctx.last_status().code(),
        Err(code) => code,
    }
}

/// Message of the last call on this context (empty after success).
///
/// Always UTF-8, independent of the default encoding.
///
/// The pointer stays valid until the next call on the same context. Returns
/// null for a null or foreign context.
#[unsafe(no_mangle)]
pub extern "C" fn grt_get_errno_msg(thread: *const grt_thread) -> *const c_char {
    match owned_context(thread) {
        Ok(ctx) => ctx.channel().message_ptr(),
        Err(_) => std::ptr::null(),
    }
}

/// Reset this context to success.
#[unsafe(no_mangle)]
pub extern "C" fn grt_clear_errno(thread: *const grt_thread) -> StatusCode {
    match owned_context(thread) {
        Ok(ctx) => {
            ctx.channel().clear();
            GRT_STATUS_SUCCESS
        }
        Err(code) => code,
    }
}

/// Copy the last error message into a caller buffer.
///
/// Messages are always UTF-8, independent of the default encoding.
///
/// # Arguments
/// * `buf` - Output buffer (NUL-terminated). Pass null to query the length.
/// * `buf_len` - Size of the buffer in bytes
/// * `out_len` - Output: required size in bytes, including the terminator
///
/// # Returns
/// * `GRT_STATUS_SUCCESS` - Message written, or length query succeeded
/// * `GRT_STATUS_NULL_POINTER` - `out_len` is null
/// * `GRT_STATUS_ILLEGAL_ARGUMENT` - Buffer too small; `out_len` holds the required size
#[unsafe(no_mangle)]
pub extern "C" fn grt_copy_errno_msg(
    thread: *const grt_thread,
    buf: *mut u8,
    buf_len: libc::size_t,
    out_len: *mut libc::size_t,
) -> StatusCode {
    let ctx = match owned_context(thread) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };
    if out_len.is_null() {
        return GRT_STATUS_NULL_POINTER;
    }

    let channel = ctx.channel();
    let msg = channel.message_bytes_with_nul();
    let required_len = msg.len();

    unsafe { *out_len = required_len };

    if buf.is_null() {
        return GRT_STATUS_SUCCESS;
    }

    if buf_len < required_len {
        return GRT_STATUS_ILLEGAL_ARGUMENT;
    }

    unsafe { std::ptr::copy_nonoverlapping(msg.as_ptr(), buf, required_len) };

    GRT_STATUS_SUCCESS
}

fn status_cname(status: Status) -> &'static CStr {
    match status {
        Status::Success => c"SUCCESS",
        Status::GenericError => c"ERROR",
        Status::IllegalArgument => c"ILLEGAL_ARGUMENT",
        Status::UnsupportedOperation => c"UNSUPPORTED_OPERATION",
        Status::IndexOutOfBounds => c"INDEX_OUT_OF_BOUNDS",
        Status::NoSuchElement => c"NO_SUCH_ELEMENT",
        Status::NullReference => c"NULL_POINTER",
        Status::ClassCast => c"CLASS_CAST",
        Status::IoError => c"IO_ERROR",
        Status::ExportError => c"EXPORT_ERROR",
        Status::ImportError => c"IMPORT_ERROR",
        Status::NegativeCycleDetected => c"NEGATIVE_CYCLE_DETECTED",
        Status::NumberFormatError => c"NUMBER_FORMAT_ERROR",
        Status::InvalidHandle => c"INVALID_HANDLE",
        Status::InvalidVertex => c"INVALID_VERTEX",
        Status::InvalidEdge => c"INVALID_EDGE",
        Status::GraphIsUnweighted => c"GRAPH_IS_UNWEIGHTED",
        Status::GraphNotUndirected => c"GRAPH_NOT_UNDIRECTED",
        Status::MapNoSuchKey => c"MAP_NO_SUCH_KEY",
    }
}

/// Static name of a status code, or `"UNKNOWN"`. Never free the result.
#[unsafe(no_mangle)]
pub extern "C" fn grt_status_name(code: StatusCode) -> *const c_char {
    Status::from_code(code)
        .map_or(c"UNKNOWN", status_cname)
        .as_ptr()
}

/// Set the encoding of strings handed out to native code.
///
/// # Arguments
/// * `encoding` - 0 = UTF-8, 1 = UTF-16 (native endian), 2 = ISO-8859-1
#[unsafe(no_mangle)]
pub extern "C" fn grt_set_default_encoding(
    thread: *const grt_thread,
    encoding: libc::c_int,
) -> StatusCode {
    crate::run(thread, || DEFAULT_ENCODING.set_code(encoding))
}

/// Current encoding of strings handed out to native code.
#[unsafe(no_mangle)]
pub extern "C" fn grt_get_default_encoding(
    thread: *const grt_thread,
    out_encoding: *mut libc::c_int,
) -> StatusCode {
    crate::run(thread, || {
        crate::write_out(out_encoding, DEFAULT_ENCODING.get() as libc::c_int);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Attached;
    use crate::*;

    #[test]
    fn test_attach_detach() {
        assert_eq!(grt_thread_attach(std::ptr::null_mut()), GRT_STATUS_NULL_POINTER);
        let mut thread: *mut grt_thread = std::ptr::null_mut();
        assert_eq!(grt_thread_attach(&mut thread), GRT_STATUS_SUCCESS);
        assert!(!thread.is_null());
        assert_eq!(grt_get_errno(thread), GRT_STATUS_SUCCESS);
        assert_eq!(grt_thread_detach(thread), GRT_STATUS_SUCCESS);
        assert_eq!(grt_thread_detach(std::ptr::null_mut()), GRT_STATUS_NULL_POINTER);
    }

    #[test]
    fn test_never_issued_handle_sets_errno() {
        let t = Attached::new();
        let status = grt_handles_destroy(t.0, 999_999);
        assert_eq!(status, GRT_STATUS_INVALID_HANDLE);
        assert_eq!(grt_get_errno(t.0), GRT_STATUS_INVALID_HANDLE);
        assert!(!t.message().is_empty());

        assert_eq!(grt_clear_errno(t.0), GRT_STATUS_SUCCESS);
        assert_eq!(grt_get_errno(t.0), GRT_STATUS_SUCCESS);
        assert!(t.message().is_empty());
    }

    #[test]
    fn test_copy_errno_msg() {
        let t = Attached::new();
        grt_handles_destroy(t.0, 999_999);

        let mut len: usize = 0;
        let status = grt_copy_errno_msg(t.0, std::ptr::null_mut(), 0, &mut len);
        assert_eq!(status, GRT_STATUS_SUCCESS);
        assert!(len > 1);

        let mut small = vec![0u8; 1];
        let status = grt_copy_errno_msg(t.0, small.as_mut_ptr(), small.len(), &mut len);
        assert_eq!(status, GRT_STATUS_ILLEGAL_ARGUMENT);

        let mut buf = vec![0u8; len];
        let status = grt_copy_errno_msg(t.0, buf.as_mut_ptr(), buf.len(), &mut len);
        assert_eq!(status, GRT_STATUS_SUCCESS);
        let msg = CStr::from_bytes_until_nul(&buf).unwrap().to_str().unwrap();
        assert_eq!(msg, t.message());

        // Reading the message does not reset the channel.
        assert_eq!(grt_get_errno(t.0), GRT_STATUS_INVALID_HANDLE);
    }

    struct RestoreEncoding(libc::c_int);

    impl Drop for RestoreEncoding {
        fn drop(&mut self) {
            DEFAULT_ENCODING.set_code(self.0).unwrap();
        }
    }

    #[test]
    fn test_messages_stay_utf8_under_utf16_default() {
        let t = Attached::exclusive();
        let _restore = RestoreEncoding(DEFAULT_ENCODING.get() as libc::c_int);
        assert_eq!(grt_set_default_encoding(t.0, 1), GRT_STATUS_SUCCESS);

        assert_eq!(grt_handles_destroy(t.0, 999_999), GRT_STATUS_INVALID_HANDLE);
        let msg = t.message();
        assert!(msg.starts_with("Invalid handle"), "{msg}");

        let mut len: usize = 0;
        grt_copy_errno_msg(t.0, std::ptr::null_mut(), 0, &mut len);
        assert_eq!(len, msg.len() + 1);
        let mut buf = vec![0xffu8; len];
        let status = grt_copy_errno_msg(t.0, buf.as_mut_ptr(), buf.len(), &mut len);
        assert_eq!(status, GRT_STATUS_SUCCESS);
        assert_eq!(buf.last(), Some(&0));
        assert_eq!(&buf[..len - 1], msg.as_bytes());

        // Strings handed out are still in the default encoding.
        let text = std::ffi::CString::new("ab").unwrap();
        let mut h: grt_handle = 0;
        assert_eq!(grt_string_create(t.0, text.as_ptr(), 0, &mut h), GRT_STATUS_SUCCESS);
        let mut ptr: *const c_char = std::ptr::null();
        grt_handles_get_ccharpointer(t.0, h, &mut ptr);
        let bytes = unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), 6) };
        let expected: Vec<u8> = [u16::from(b'a'), u16::from(b'b'), 0]
            .into_iter()
            .flat_map(u16::to_ne_bytes)
            .collect();
        assert_eq!(bytes, expected.as_slice());
        grt_handles_destroy(t.0, h);
    }

    #[test]
    fn test_status_name() {
        let name = |code| unsafe { CStr::from_ptr(grt_status_name(code)) }.to_str().unwrap();
        assert_eq!(name(GRT_STATUS_SUCCESS), "SUCCESS");
        assert_eq!(name(GRT_STATUS_MAP_NO_SUCH_KEY), "MAP_NO_SUCH_KEY");
        assert_eq!(name(-5), "UNKNOWN");
        for status in Status::ALL {
            assert_eq!(name(status.code()), status.name());
        }
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let t = Attached::new();
        assert_eq!(
            grt_set_default_encoding(t.0, 17),
            GRT_STATUS_ILLEGAL_ARGUMENT
        );
        let mut encoding = -1;
        assert_eq!(
            grt_get_default_encoding(t.0, &mut encoding),
            GRT_STATUS_SUCCESS
        );
        assert!((0..=2).contains(&encoding));
    }
}
