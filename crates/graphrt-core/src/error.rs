//! Error type for runtime operations

use std::num::{ParseFloatError, ParseIntError};
use std::str::Utf8Error;

use thiserror::Error;

use crate::status::Status;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur inside the runtime or its collaborators
#[derive(Error, Debug)]
pub enum Error {
    /// A handle was never issued or has already been destroyed
    #[error("Invalid handle: {0:#x}")]
    InvalidHandle(u64),

    /// An argument was rejected
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// A required pointer was null
    #[error("Null reference: {0}")]
    NullReference(&'static str),

    /// A managed object or value had a different type than requested
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The type the operation requires
        expected: &'static str,
        /// The type actually found
        found: String,
    },

    /// Keyed lookup found nothing
    #[error("Key {0} not found")]
    MapNoSuchKey(String),

    /// An iterator was exhausted or a removal target did not exist
    #[error("No such element: {0}")]
    NoSuchElement(String),

    /// Positional access outside the valid range
    #[error("Index out of bounds: index {index} (len: {len})")]
    IndexOutOfBounds {
        /// The requested index
        index: usize,
        /// The length of the sequence
        len: usize,
    },

    /// The target does not support the requested operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Text could not be converted to the requested numeric type
    #[error("Cannot convert {text:?} to {target}")]
    NumberFormat {
        /// The offending text
        text: String,
        /// Name of the requested numeric type
        target: &'static str,
    },

    /// Integer parse failure
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),

    /// Float parse failure
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),

    /// Native bytes were not valid UTF-8
    #[error("Invalid UTF-8 in string: {0}")]
    Utf8(#[from] Utf8Error),

    /// Input/output failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failure signalled by a collaborator with an explicit status
    #[error("{}", status_message(.status, .message))]
    Status {
        /// Taxonomy member reported across the boundary
        status: Status,
        /// Optional detail; a synthesized text is used when absent
        message: Option<String>,
    },

    /// Anything else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn status_message(status: &Status, message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => m.clone(),
        _ => synthesized_message(*status),
    }
}

/// Message used when a failure carries no text of its own.
pub fn synthesized_message(status: Status) -> String {
    format!("Error: {} ({})", status.description(), status.name())
}

impl Error {
    /// Failure with an explicit status and message.
    pub fn with_status(status: Status, message: impl Into<String>) -> Self {
        Error::Status {
            status,
            message: Some(message.into()),
        }
    }

    /// Failure with an explicit status and a synthesized message.
    pub fn from_status(status: Status) -> Self {
        Error::Status {
            status,
            message: None,
        }
    }

    /// Map this error to its taxonomy member.
    pub fn status(&self) -> Status {
        match self {
            Error::InvalidHandle(_) => Status::InvalidHandle,
            Error::IllegalArgument(_) => Status::IllegalArgument,
            Error::NullReference(_) => Status::NullReference,
            Error::TypeMismatch { .. } => Status::ClassCast,
            Error::MapNoSuchKey(_) => Status::MapNoSuchKey,
            Error::NoSuchElement(_) => Status::NoSuchElement,
            Error::IndexOutOfBounds { .. } => Status::IndexOutOfBounds,
            Error::Unsupported(_) => Status::UnsupportedOperation,
            Error::NumberFormat { .. } | Error::ParseInt(_) | Error::ParseFloat(_) => {
                Status::NumberFormatError
            }
            Error::Utf8(_) => Status::IllegalArgument,
            Error::Io(_) => Status::IoError,
            // A success status is not a failure kind.
            Error::Status {
                status: Status::Success,
                ..
            } => Status::GenericError,
            Error::Status { status, .. } => *status,
            Error::Other(err) => other_status(err),
        }
    }

    /// Non-empty message describing this error.
    pub fn message(&self) -> String {
        let text = self.to_string();
        if text.is_empty() {
            synthesized_message(self.status())
        } else {
            text
        }
    }
}

/// Walk an opaque error chain looking for a recognizable cause.
fn other_status(err: &anyhow::Error) -> Status {
    for cause in err.chain() {
        if let Some(inner) = cause.downcast_ref::<Error>() {
            return inner.status();
        }
        if cause.is::<std::io::Error>() {
            return Status::IoError;
        }
        if cause.is::<ParseIntError>() || cause.is::<ParseFloatError>() {
            return Status::NumberFormatError;
        }
    }
    Status::GenericError
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Error::from_status(status)
    }
}
