//! Opaque types for C API
//!
//! Managed objects are reached through integer handles; only the thread
//! context is handed out as a pointer.

use std::ffi::c_void;

use graphrt_core::{Element, Error, Result, ThreadContext};

/// Handle to a managed object. Zero is never a valid handle.
pub type grt_handle = u64;

/// Opaque calling-thread context.
///
/// Created by `grt_thread_attach` and bound to the OS thread that created it.
#[repr(C)]
pub struct grt_thread {
    pub(crate) _private: *const c_void,
}

impl grt_thread {
    pub(crate) fn new(ctx: ThreadContext) -> Self {
        Self {
            _private: Box::into_raw(Box::new(ctx)) as *const c_void,
        }
    }

    pub(crate) fn inner(&self) -> &ThreadContext {
        unsafe { &*(self._private as *const ThreadContext) }
    }
}

impl Drop for grt_thread {
    fn drop(&mut self) {
        if !self._private.is_null() {
            unsafe {
                let _ = Box::from_raw(self._private as *mut ThreadContext);
            }
        }
    }
}

// Safety: the context only exposes a mutex-guarded channel
unsafe impl Send for grt_thread {}
unsafe impl Sync for grt_thread {}

/// Kind of graph element an attribute is attached to.
///
/// Passed across the boundary as a plain `int`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum grt_element_kind {
    /// A vertex
    Vertex = 0,
    /// An edge
    Edge = 1,
    /// The graph itself; the element id is ignored
    Graph = 2,
}

impl TryFrom<libc::c_int> for grt_element_kind {
    type Error = Error;

    fn try_from(code: libc::c_int) -> Result<Self> {
        match code {
            0 => Ok(Self::Vertex),
            1 => Ok(Self::Edge),
            2 => Ok(Self::Graph),
            _ => Err(Error::IllegalArgument(format!(
                "unknown element kind {code}"
            ))),
        }
    }
}

impl grt_element_kind {
    /// Build a store element from a kind code and an id.
    pub(crate) fn element<T>(code: libc::c_int, id: T) -> Result<Element<T, T>> {
        Ok(match Self::try_from(code)? {
            Self::Vertex => Element::Vertex(id),
            Self::Edge => Element::Edge(id),
            Self::Graph => Element::Graph,
        })
    }
}

/// Hash function for caller references.
///
/// Must return equal values for references the paired equality function
/// considers equal, and must not call back into the store.
pub type grt_hash_fn = extern "C" fn(ptr: *const c_void) -> i64;

/// Equality function for caller references. Returns non-zero when equal.
pub type grt_equals_fn = extern "C" fn(a: *const c_void, b: *const c_void) -> libc::c_int;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_kind_codes() {
        assert_eq!(grt_element_kind::element(0, 7i64).unwrap(), Element::Vertex(7));
        assert_eq!(grt_element_kind::element(1, 7i64).unwrap(), Element::Edge(7));
        assert_eq!(grt_element_kind::element(2, 7i64).unwrap(), Element::Graph);
        assert!(grt_element_kind::element(3, 7i64).is_err());
    }
}
