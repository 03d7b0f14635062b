//! Error types for runtime operations

use derive_more::{Display, Error};

use crate::value::Tag;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Which table a handle belongs to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    #[display("string")]
    String,
    #[display("array")]
    Array,
}

/// Errors reported by string and array operations.
///
/// A failed operation never leaves a partial mutation behind.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Index outside the valid range for a read, write, insert or remove.
    #[display("Index error: index {index} out of range for length {len}")]
    Index { index: usize, len: usize },

    /// Malformed `[begin, end)` pair for a substring or slice.
    #[display("Range error: [{begin}, {end}) is not a valid range for length {len}")]
    Range { begin: usize, end: usize, len: usize },

    /// Negative index passed through the C interface.
    #[display("Index error: negative index {index}")]
    NegativeIndex { index: i64 },

    /// Range with a negative bound passed through the C interface.
    #[display("Range error: [{begin}, {end}) has a negative bound")]
    NegativeRange { begin: i64, end: i64 },

    /// `pop` or `shift` on an empty array.
    #[display("Empty error: array has no elements")]
    Empty,

    /// An element's tag violates the operation's precondition.
    #[display("Type error: element {index} is {found}, expected INT")]
    Type { index: usize, found: Tag },

    /// A tag code from the C interface names no known tag.
    #[display("Type error: unknown tag code {_0}")]
    UnknownTag(#[error(not(source))] i32),

    /// The handle does not refer to a live object.
    #[display("Stale handle: {kind} #{id} is not live")]
    StaleHandle { kind: HandleKind, id: u64 },

    /// `stringify` reached an array that is already being rendered.
    #[display("Cycle error: array #{id} is reachable from itself")]
    Cycle { id: u64 },

    /// `stringify` nesting exceeded the configured depth.
    #[display("Nesting deeper than {limit} levels")]
    TooDeep { limit: usize },

    /// The requested size cannot be allocated.
    #[display("Capacity error: cannot allocate {requested} slots")]
    Capacity { requested: usize },

    /// Writing to an output collaborator failed.
    #[display("I/O error: {_0}")]
    Io(#[error(not(source))] String),
}

impl From<std::io::Error> for RuntimeError {
    fn from(error: std::io::Error) -> Self {
        RuntimeError::Io(error.to_string())
    }
}

impl RuntimeError {
    /// Stable numeric code reported through the C interface. Zero means no error.
    pub fn code(&self) -> i32 {
        match self {
            RuntimeError::Index { .. } | RuntimeError::NegativeIndex { .. } => 1,
            RuntimeError::Range { .. } | RuntimeError::NegativeRange { .. } => 2,
            RuntimeError::Empty => 3,
            RuntimeError::Type { .. } => 4,
            RuntimeError::StaleHandle { .. } => 5,
            RuntimeError::Cycle { .. } => 6,
            RuntimeError::TooDeep { .. } => 7,
            RuntimeError::Io(_) => 8,
            RuntimeError::UnknownTag(_) => 9,
            RuntimeError::Capacity { .. } => 10,
        }
    }

    pub(crate) fn check_range(begin: usize, end: usize, len: usize) -> Result<()> {
        if begin > end || end > len {
            return Err(RuntimeError::Range { begin, end, len });
        }
        Ok(())
    }
}
