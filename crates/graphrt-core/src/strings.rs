//! String marshaling between native byte strings and Rust strings.
//!
//! Native strings are NUL-terminated. Text leaving the runtime is copied into
//! a [`NativeString`], a heap buffer that stays at a fixed address until the
//! value is dropped or [`NativeString::release`] is called.

use std::ffi::c_char;
use std::fmt;

use crate::config;
use crate::error::{Error, Result};

/// Character encoding of a native string.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// UTF-8, terminated by a single zero byte.
    #[default]
    Utf8 = 0,
    /// UTF-16 in native byte order, terminated by a zero code unit.
    Utf16 = 1,
    /// ISO-8859-1; characters above U+00FF are written as `?`.
    Latin1 = 2,
}

impl Encoding {
    /// Decode a wire value.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Encoding::Utf8),
            1 => Some(Encoding::Utf16),
            2 => Some(Encoding::Latin1),
            _ => None,
        }
    }

    /// Width of one code unit, which is also the width of the terminator.
    pub const fn unit_width(self) -> usize {
        match self {
            Encoding::Utf16 => 2,
            Encoding::Utf8 | Encoding::Latin1 => 1,
        }
    }

    /// Lower-case encoding name.
    pub const fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16 => "utf-16",
            Encoding::Latin1 => "iso-8859-1",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A NUL-terminated buffer handed out to native code.
///
/// The buffer is allocated once and never reallocated, so the pointer from
/// [`NativeString::as_ptr`] is stable for the lifetime of the value. Dropping
/// the value (or calling [`NativeString::release`]) frees the buffer; native
/// code must not use the pointer afterwards.
pub struct NativeString {
    bytes: Box<[u8]>,
    encoding: Encoding,
}

impl NativeString {
    /// Encode `text` in the process-wide default encoding.
    pub fn new(text: &str) -> Result<Self> {
        Self::with_encoding(text, config::default_encoding())
    }

    /// Encode `text` with an explicit encoding.
    ///
    /// Text containing U+0000 cannot be represented and is rejected.
    pub fn with_encoding(text: &str, encoding: Encoding) -> Result<Self> {
        if text.contains('\0') {
            return Err(Error::IllegalArgument(format!(
                "null byte in string: {text:?}"
            )));
        }
        let mut bytes = encode(text, encoding);
        bytes.extend(std::iter::repeat_n(0u8, encoding.unit_width()));
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
            encoding,
        })
    }

    /// Pointer to the first byte; valid until this value is released.
    #[inline]
    pub fn as_ptr(&self) -> *const c_char {
        self.bytes.as_ptr().cast()
    }

    /// Encoded bytes without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - self.encoding.unit_width()]
    }

    /// Encoded bytes including the terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bytes, excluding the terminator.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the encoded text is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The encoding of the buffer.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Decode the buffer back to a Rust string.
    pub fn to_text(&self) -> Result<String> {
        decode(self.as_bytes(), self.encoding)
    }

    /// Release the buffer explicitly.
    pub fn release(self) {
        drop(self);
    }
}

impl fmt::Debug for NativeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeString")
            .field("ptr", &self.bytes.as_ptr())
            .field("len", &self.len())
            .field("encoding", &self.encoding)
            .finish()
    }
}

fn encode(text: &str, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Utf8 => text.as_bytes().to_vec(),
        Encoding::Utf16 => text.encode_utf16().flat_map(u16::to_ne_bytes).collect(),
        Encoding::Latin1 => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect(),
    }
}

fn decode(bytes: &[u8], encoding: Encoding) -> Result<String> {
    match encoding {
        Encoding::Utf8 => Ok(std::str::from_utf8(bytes)?.to_owned()),
        Encoding::Utf16 => {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units)
                .map_err(|e| Error::IllegalArgument(format!("invalid UTF-16 in string: {e}")))
        }
        Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// Length in bytes of the native string at `ptr`, excluding the terminator.
///
/// # Safety
///
/// `ptr` must be non-null and point to a string terminated by a zero code
/// unit of the given encoding.
unsafe fn terminated_len(ptr: *const c_char, encoding: Encoding) -> usize {
    let bytes = ptr.cast::<u8>();
    match encoding.unit_width() {
        1 => unsafe { std::ffi::CStr::from_ptr(ptr) }.to_bytes().len(),
        _ => {
            let mut len = 0usize;
            loop {
                let (lo, hi) = unsafe { (*bytes.add(len), *bytes.add(len + 1)) };
                if lo == 0 && hi == 0 {
                    return len;
                }
                len += 2;
            }
        }
    }
}

/// Convert a native string into a Rust string.
///
/// A null pointer is an error ([`Error::NullReference`]); use
/// [`from_native_nullable`] where null legitimately means "no value".
///
/// # Safety
///
/// If non-null, `ptr` must point to a string terminated by a zero code unit
/// of `encoding`, valid for reads up to and including the terminator.
pub unsafe fn from_native(ptr: *const c_char, encoding: Encoding) -> Result<String> {
    if ptr.is_null() {
        return Err(Error::NullReference("string pointer"));
    }
    let len = unsafe { terminated_len(ptr, encoding) };
    let bytes = unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len) };
    decode(bytes, encoding)
}

/// Convert a native string into a Rust string, mapping null to `None`.
///
/// # Safety
///
/// Same contract as [`from_native`].
pub unsafe fn from_native_nullable(
    ptr: *const c_char,
    encoding: Encoding,
) -> Result<Option<String>> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { from_native(ptr, encoding) }.map(Some)
}

/// Convert a UTF-8 native string (the common case).
///
/// # Safety
///
/// Same contract as [`from_native`].
pub unsafe fn from_native_utf8(ptr: *const c_char) -> Result<String> {
    unsafe { from_native(ptr, Encoding::Utf8) }
}

/// Encode text for native code in the given encoding.
pub fn to_native(text: &str, encoding: Encoding) -> Result<NativeString> {
    NativeString::with_encoding(text, encoding)
}
