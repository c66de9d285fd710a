//! Runtime configuration and process-wide defaults.
//!
//! Defaults live in const-constructible globals with atomic access so they
//! can be read on every call without locking.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::error::{Error, Result};
use crate::strings::Encoding;

/// A global default string encoding with atomic access.
///
/// # Example
///
/// ```
/// use graphrt_core::{DefaultEncoding, Encoding};
///
/// static MY_ENCODING: DefaultEncoding = DefaultEncoding::new(Encoding::Utf8);
///
/// MY_ENCODING.set(Encoding::Latin1);
/// assert_eq!(MY_ENCODING.get(), Encoding::Latin1);
/// ```
pub struct DefaultEncoding {
    code: AtomicI32,
}

impl DefaultEncoding {
    /// Create a new global default with the given initial encoding.
    #[must_use]
    pub const fn new(initial: Encoding) -> Self {
        Self {
            code: AtomicI32::new(initial as i32),
        }
    }

    /// Get the current default encoding.
    #[must_use]
    pub fn get(&self) -> Encoding {
        Encoding::from_code(self.code.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Set a new default encoding.
    pub fn set(&self, encoding: Encoding) {
        self.code.store(encoding as i32, Ordering::Relaxed);
    }

    /// Set a new default encoding from its wire value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] for an unknown code.
    pub fn set_code(&self, code: i32) -> Result<()> {
        let encoding = Encoding::from_code(code)
            .ok_or_else(|| Error::IllegalArgument(format!("unknown encoding code {code}")))?;
        self.set(encoding);
        Ok(())
    }
}

/// Encoding used for strings handed out to native code when the caller does
/// not name one.
pub static DEFAULT_ENCODING: DefaultEncoding = DefaultEncoding::new(Encoding::Utf8);

/// Current process-wide default encoding.
pub fn default_encoding() -> Encoding {
    DEFAULT_ENCODING.get()
}

/// Settings for a [`crate::HandleRegistry`] and the string marshaler.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Slots pre-allocated in the handle table.
    pub initial_handle_capacity: usize,
    /// Encoding for strings created without an explicit one.
    pub default_encoding: Encoding,
    /// Log a warning when a registry is dropped with live handles.
    pub leak_warning: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            initial_handle_capacity: 64,
            default_encoding: Encoding::Utf8,
            leak_warning: true,
        }
    }
}

impl RuntimeConfig {
    /// Configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial handle table capacity.
    pub fn with_initial_handle_capacity(mut self, capacity: usize) -> Self {
        self.initial_handle_capacity = capacity;
        self
    }

    /// Set the default string encoding.
    pub fn with_default_encoding(mut self, encoding: Encoding) -> Self {
        self.default_encoding = encoding;
        self
    }

    /// Enable or disable the leak warning.
    pub fn with_leak_warning(mut self, enabled: bool) -> Self {
        self.leak_warning = enabled;
        self
    }

    /// Install the process-wide parts of this configuration.
    pub fn apply_global(&self) {
        DEFAULT_ENCODING.set(self.default_encoding);
    }
}
