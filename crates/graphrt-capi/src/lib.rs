#![warn(missing_docs)]
//! C API for the graphrt boundary runtime
//!
//! Native code drives managed objects through opaque integer handles and
//! reads failures back through a per-thread error channel.
//!
//! ## Calling convention
//!
//! - Every function takes a `grt_thread*` obtained from `grt_thread_attach`
//!   on the calling thread, and returns a status code (`GRT_STATUS_SUCCESS`
//!   is 0).
//! - On failure the status and a message are stored in the thread's error
//!   channel (`grt_get_errno`, `grt_get_errno_msg`). Out-parameters are only
//!   written on success, and only when non-null.
//! - A null thread returns `GRT_STATUS_NULL_POINTER`; a thread used from
//!   another OS thread returns `GRT_STATUS_ILLEGAL_ARGUMENT`. Neither is
//!   recorded.
//! - Handles are released with `grt_handles_destroy`.
//! - Rust panics never cross the boundary; they are reported as
//!   `GRT_STATUS_ERROR`.

// C API requires unsafe operations with raw pointers
#![allow(clippy::not_unsafe_ptr_arg_deref)]
#![allow(non_camel_case_types)]

#[macro_use]
mod macros;

mod any_store;
mod attrs_store;
mod errors;
mod handles;
mod iterators;
mod registry;
mod strref_store;
mod types;

pub use any_store::*;
pub use attrs_store::*;
pub use errors::*;
pub use handles::*;
pub use iterators::*;
pub use registry::*;
pub use strref_store::*;
pub use types::*;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use graphrt_core::{handle, Error, Result, Status};

/// Status code type for C API
pub type StatusCode = libc::c_int;

/// Operation completed successfully.
pub const GRT_STATUS_SUCCESS: StatusCode = Status::Success.code();
/// Unrecognized failure, including caught panics.
pub const GRT_STATUS_ERROR: StatusCode = Status::GenericError.code();
/// An argument was rejected.
pub const GRT_STATUS_ILLEGAL_ARGUMENT: StatusCode = Status::IllegalArgument.code();
/// The target does not support the operation.
pub const GRT_STATUS_UNSUPPORTED_OPERATION: StatusCode = Status::UnsupportedOperation.code();
/// An index was out of range.
pub const GRT_STATUS_INDEX_OUT_OF_BOUNDS: StatusCode = Status::IndexOutOfBounds.code();
/// An iterator was exhausted or a removal target was missing.
pub const GRT_STATUS_NO_SUCH_ELEMENT: StatusCode = Status::NoSuchElement.code();
/// A required pointer was null.
pub const GRT_STATUS_NULL_POINTER: StatusCode = Status::NullReference.code();
/// A handle referenced an object of another type.
pub const GRT_STATUS_CLASS_CAST: StatusCode = Status::ClassCast.code();
/// Input/output failure.
pub const GRT_STATUS_IO_ERROR: StatusCode = Status::IoError.code();
/// Exporter failure.
pub const GRT_STATUS_EXPORT_ERROR: StatusCode = Status::ExportError.code();
/// Importer failure.
pub const GRT_STATUS_IMPORT_ERROR: StatusCode = Status::ImportError.code();
/// A negative cycle was detected.
pub const GRT_STATUS_NEGATIVE_CYCLE_DETECTED: StatusCode = Status::NegativeCycleDetected.code();
/// Text could not be parsed as a number.
pub const GRT_STATUS_NUMBER_FORMAT_ERROR: StatusCode = Status::NumberFormatError.code();
/// A handle was never issued or has been destroyed.
pub const GRT_STATUS_INVALID_HANDLE: StatusCode = Status::InvalidHandle.code();
/// A vertex is not part of the graph.
pub const GRT_STATUS_INVALID_VERTEX: StatusCode = Status::InvalidVertex.code();
/// An edge is not part of the graph.
pub const GRT_STATUS_INVALID_EDGE: StatusCode = Status::InvalidEdge.code();
/// The graph is unweighted.
pub const GRT_STATUS_GRAPH_IS_UNWEIGHTED: StatusCode = Status::GraphIsUnweighted.code();
/// The graph is not undirected.
pub const GRT_STATUS_GRAPH_NOT_UNDIRECTED: StatusCode = Status::GraphNotUndirected.code();
/// A keyed lookup found nothing.
pub const GRT_STATUS_MAP_NO_SUCH_KEY: StatusCode = Status::MapNoSuchKey.code();

// ============================================================================
// Entry-point plumbing
// ============================================================================

/// Run an entry-point body against the caller's thread context.
///
/// Clears the channel, contains panics, and records any failure.
pub(crate) fn run<F>(thread: *const grt_thread, body: F) -> StatusCode
where
    F: FnOnce() -> Result<()>,
{
    if thread.is_null() {
        return GRT_STATUS_NULL_POINTER;
    }
    let ctx = unsafe { &*thread }.inner();
    if !ctx.is_current_thread() {
        return GRT_STATUS_ILLEGAL_ARGUMENT;
    }
    ctx.channel().clear();

    let outcome = match catch_unwind(AssertUnwindSafe(body)) {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(&panic);
            tracing::warn!(%message, "panic caught at the C boundary");
            Err(Error::with_status(Status::GenericError, message))
        }
    };
    ctx.complete(outcome).code()
}

fn panic_message(info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Resolve a handle in the global registry.
pub(crate) fn resolve<T: Any + Send + Sync>(handle: grt_handle) -> Result<Arc<T>> {
    handle::global().resolve::<T>(handle)
}

/// Register an object in the global registry.
pub(crate) fn register<T: Any + Send + Sync>(object: T) -> Result<grt_handle> {
    handle::global().create(object)
}

/// Write an out-parameter if the caller supplied one.
pub(crate) fn write_out<T>(out: *mut T, value: T) {
    if !out.is_null() {
        unsafe { out.write(value) };
    }
}

/// Fail on a null required pointer.
pub(crate) fn require<T>(ptr: *const T, what: &'static str) -> Result<()> {
    if ptr.is_null() {
        Err(Error::NullReference(what))
    } else {
        Ok(())
    }
}
