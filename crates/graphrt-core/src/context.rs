//! Per-thread error channel and calling-thread context.

use std::ffi::c_char;
use std::thread::ThreadId;

use parking_lot::{Mutex, MutexGuard};

use crate::error::{synthesized_message, Error, Result};
use crate::status::Status;
use crate::strings::{Encoding, NativeString};

static EMPTY_MESSAGE: [u8; 2] = [0, 0];

/// Last-error slot of one calling thread.
///
/// Holds the status of the most recent call and, on failure, its message
/// pinned as UTF-8 whatever the process default encoding is. The pinned buffer lives until the next
/// [`ErrorChannel::set`] or [`ErrorChannel::clear`].
#[derive(Debug, Default)]
pub struct ErrorChannel {
    status: Status,
    message: Option<NativeString>,
}

impl ErrorChannel {
    /// A channel in the success state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a failure. An empty message is replaced by a synthesized one.
    pub fn set(&mut self, status: Status, message: &str) {
        if status.is_success() {
            self.clear();
            return;
        }
        let text = if message.is_empty() {
            synthesized_message(status)
        } else {
            message.replace('\0', "\u{fffd}")
        };
        self.status = status;
        self.message = NativeString::with_encoding(&text, Encoding::Utf8).ok();
    }

    /// Store the taxonomy member and message of an error.
    pub fn record(&mut self, err: &Error) {
        let status = err.status();
        let message = err.message();
        tracing::debug!(%status, %message, "error recorded");
        self.set(status, &message);
    }

    /// Reset to success and release the pinned message.
    pub fn clear(&mut self) {
        self.status = Status::Success;
        self.message = None;
    }

    /// Status of the last call.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Message of the last failure, or `None` after success.
    pub fn message(&self) -> Option<String> {
        self.message.as_ref().and_then(|m| m.to_text().ok())
    }

    /// Pinned message bytes without the terminator (empty after success).
    pub fn message_bytes(&self) -> &[u8] {
        self.message
            .as_ref()
            .map(NativeString::as_bytes)
            .unwrap_or_default()
    }

    /// Pinned message bytes including the NUL terminator.
    pub fn message_bytes_with_nul(&self) -> &[u8] {
        self.message
            .as_ref()
            .map_or(&EMPTY_MESSAGE[..1], NativeString::as_bytes_with_nul)
    }

    /// Pointer to the pinned message; an empty string after success.
    ///
    /// Valid until the channel is next set or cleared.
    pub fn message_ptr(&self) -> *const c_char {
        self.message
            .as_ref()
            .map_or(EMPTY_MESSAGE.as_ptr().cast(), NativeString::as_ptr)
    }
}

/// Context of a native thread registered to call into the runtime.
///
/// Native code obtains one per thread and passes it on every call. The
/// error channel inside is only ever touched by the owning thread.
#[derive(Debug)]
pub struct ThreadContext {
    owner: ThreadId,
    channel: Mutex<ErrorChannel>,
}

impl ThreadContext {
    /// Create a context owned by the calling thread.
    pub fn attach() -> Self {
        let owner = std::thread::current().id();
        tracing::debug!(?owner, "thread attached");
        Self {
            owner,
            channel: Mutex::new(ErrorChannel::new()),
        }
    }

    /// Thread that owns this context.
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Returns `true` if called from the owning thread.
    pub fn is_current_thread(&self) -> bool {
        std::thread::current().id() == self.owner
    }

    /// Fail unless called from the owning thread.
    pub fn check_owner(&self) -> Result<()> {
        if self.is_current_thread() {
            Ok(())
        } else {
            Err(Error::IllegalArgument(format!(
                "thread context owned by {:?} used from {:?}",
                self.owner,
                std::thread::current().id()
            )))
        }
    }

    /// Lock the error channel.
    pub fn channel(&self) -> MutexGuard<'_, ErrorChannel> {
        self.channel.lock()
    }

    /// Record the outcome of a call and return its status.
    pub fn complete(&self, result: Result<()>) -> Status {
        let mut channel = self.channel();
        match result {
            Ok(()) => {
                channel.clear();
                Status::Success
            }
            Err(err) => {
                channel.record(&err);
                channel.status()
            }
        }
    }

    /// Status of the last call on this context.
    pub fn last_status(&self) -> Status {
        self.channel().status()
    }

    /// Message of the last failure on this context.
    pub fn last_message(&self) -> Option<String> {
        self.channel().message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_starts_clear() {
        let channel = ErrorChannel::new();
        assert_eq!(channel.status(), Status::Success);
        assert!(channel.message().is_none());
        assert!(channel.message_bytes().is_empty());
        let text = unsafe { std::ffi::CStr::from_ptr(channel.message_ptr()) };
        assert!(text.to_bytes().is_empty());
    }

    #[test]
    fn test_message_bytes_carry_one_terminator() {
        let mut channel = ErrorChannel::new();
        assert_eq!(channel.message_bytes_with_nul(), &[0]);

        channel.set(Status::InvalidEdge, "edge e\u{e9} missing");
        let bytes = channel.message_bytes_with_nul();
        assert_eq!(bytes.last(), Some(&0));
        assert_eq!(&bytes[..bytes.len() - 1], "edge e\u{e9} missing".as_bytes());
        assert_eq!(bytes.len(), channel.message_bytes().len() + 1);
    }

    #[test]
    fn test_set_and_clear() {
        let mut channel = ErrorChannel::new();
        channel.set(Status::InvalidVertex, "vertex 7 not in graph");
        assert_eq!(channel.status(), Status::InvalidVertex);
        assert_eq!(channel.message().unwrap(), "vertex 7 not in graph");

        channel.clear();
        assert_eq!(channel.status(), Status::Success);
        assert!(channel.message().is_none());
    }

    #[test]
    fn test_empty_message_is_synthesized() {
        let mut channel = ErrorChannel::new();
        channel.set(Status::ImportError, "");
        let message = channel.message().unwrap();
        assert!(message.contains("IMPORT_ERROR"));
    }

    #[test]
    fn test_message_with_nul_is_kept() {
        let mut channel = ErrorChannel::new();
        channel.set(Status::GenericError, "bad\0byte");
        assert_eq!(channel.message().unwrap(), "bad\u{fffd}byte");
    }

    #[test]
    fn test_record_error() {
        let mut channel = ErrorChannel::new();
        channel.record(&Error::MapNoSuchKey("weight".into()));
        assert_eq!(channel.status(), Status::MapNoSuchKey);
        assert!(channel.message().unwrap().contains("weight"));
    }

    #[test]
    fn test_complete() {
        let ctx = ThreadContext::attach();
        assert_eq!(
            ctx.complete(Err(Error::InvalidHandle(9))),
            Status::InvalidHandle
        );
        assert_eq!(ctx.last_status(), Status::InvalidHandle);
        assert_eq!(ctx.complete(Ok(())), Status::Success);
        assert!(ctx.last_message().is_none());
    }

    #[test]
    fn test_foreign_thread_is_rejected() {
        let ctx = std::sync::Arc::new(ThreadContext::attach());
        ctx.check_owner().unwrap();
        let remote = std::sync::Arc::clone(&ctx);
        let err = std::thread::spawn(move || remote.check_owner().unwrap_err())
            .join()
            .unwrap();
        assert_eq!(err.status(), Status::IllegalArgument);
    }
}
