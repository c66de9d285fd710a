//! Status taxonomy shared by every entry point.
//!
//! The integer assigned to each variant is part of the C ABI. New variants
//! may only be appended; existing values never change.

use std::fmt;

/// Outcome category of a runtime call.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// Operation completed successfully.
    #[default]
    Success = 0,
    /// Unrecognized failure.
    GenericError = 1,
    /// An argument was rejected.
    IllegalArgument = 2,
    /// The target object does not support the operation.
    UnsupportedOperation = 3,
    /// An index was outside the valid range.
    IndexOutOfBounds = 4,
    /// An iterator or lookup had no element to return.
    NoSuchElement = 5,
    /// A required pointer or reference was null.
    NullReference = 6,
    /// An object had a different type than the operation requires.
    ClassCast = 7,
    /// Input/output failure.
    IoError = 8,
    /// Exporter failure.
    ExportError = 9,
    /// Importer failure.
    ImportError = 10,
    /// A shortest-path computation found a negative cycle.
    NegativeCycleDetected = 11,
    /// Text could not be parsed as a number.
    NumberFormatError = 12,
    /// A handle was never issued or has been destroyed.
    InvalidHandle = 13,
    /// A vertex does not belong to the graph.
    InvalidVertex = 14,
    /// An edge does not belong to the graph.
    InvalidEdge = 15,
    /// The graph carries no edge weights.
    GraphIsUnweighted = 16,
    /// The graph is not undirected.
    GraphNotUndirected = 17,
    /// A map lookup found no entry for the key.
    MapNoSuchKey = 18,
}

impl Status {
    /// Every status, ordered by wire value.
    pub const ALL: [Status; 19] = [
        Status::Success,
        Status::GenericError,
        Status::IllegalArgument,
        Status::UnsupportedOperation,
        Status::IndexOutOfBounds,
        Status::NoSuchElement,
        Status::NullReference,
        Status::ClassCast,
        Status::IoError,
        Status::ExportError,
        Status::ImportError,
        Status::NegativeCycleDetected,
        Status::NumberFormatError,
        Status::InvalidHandle,
        Status::InvalidVertex,
        Status::InvalidEdge,
        Status::GraphIsUnweighted,
        Status::GraphNotUndirected,
        Status::MapNoSuchKey,
    ];

    /// Wire value of this status.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Decode a wire value. Unknown values yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Returns `true` for [`Status::Success`].
    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Stable upper-case name, as it appears in the C header.
    pub const fn name(self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::GenericError => "ERROR",
            Status::IllegalArgument => "ILLEGAL_ARGUMENT",
            Status::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            Status::IndexOutOfBounds => "INDEX_OUT_OF_BOUNDS",
            Status::NoSuchElement => "NO_SUCH_ELEMENT",
            Status::NullReference => "NULL_POINTER",
            Status::ClassCast => "CLASS_CAST",
            Status::IoError => "IO_ERROR",
            Status::ExportError => "EXPORT_ERROR",
            Status::ImportError => "IMPORT_ERROR",
            Status::NegativeCycleDetected => "NEGATIVE_CYCLE_DETECTED",
            Status::NumberFormatError => "NUMBER_FORMAT_ERROR",
            Status::InvalidHandle => "INVALID_HANDLE",
            Status::InvalidVertex => "INVALID_VERTEX",
            Status::InvalidEdge => "INVALID_EDGE",
            Status::GraphIsUnweighted => "GRAPH_IS_UNWEIGHTED",
            Status::GraphNotUndirected => "GRAPH_NOT_UNDIRECTED",
            Status::MapNoSuchKey => "MAP_NO_SUCH_KEY",
        }
    }

    /// Human-readable description used when a failure carries no message.
    pub const fn description(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::GenericError => "error",
            Status::IllegalArgument => "illegal argument",
            Status::UnsupportedOperation => "unsupported operation",
            Status::IndexOutOfBounds => "index out of bounds",
            Status::NoSuchElement => "no such element",
            Status::NullReference => "null reference",
            Status::ClassCast => "class cast",
            Status::IoError => "i/o error",
            Status::ExportError => "export error",
            Status::ImportError => "import error",
            Status::NegativeCycleDetected => "negative cycle detected",
            Status::NumberFormatError => "number format error",
            Status::InvalidHandle => "invalid handle",
            Status::InvalidVertex => "invalid vertex",
            Status::InvalidEdge => "invalid edge",
            Status::GraphIsUnweighted => "graph is unweighted",
            Status::GraphNotUndirected => "graph is not undirected",
            Status::MapNoSuchKey => "map has no such key",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_are_pinned() {
        assert_eq!(Status::Success.code(), 0);
        assert_eq!(Status::GenericError.code(), 1);
        assert_eq!(Status::ExportError.code(), 9);
        assert_eq!(Status::InvalidHandle.code(), 13);
        assert_eq!(Status::MapNoSuchKey.code(), 18);
    }

    #[test]
    fn test_all_is_ordered_by_code() {
        for (idx, status) in Status::ALL.iter().enumerate() {
            assert_eq!(status.code() as usize, idx);
            assert_eq!(Status::from_code(status.code()), Some(*status));
        }
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(Status::from_code(-1), None);
        assert_eq!(Status::from_code(19), None);
        assert_eq!(Status::from_code(i32::MAX), None);
    }

    #[test]
    fn test_names_are_distinct() {
        let mut names: Vec<_> = Status::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Status::ALL.len());
    }
}
