use thiserror::Error;

use crate::HeapId;

/// Errors raised by heap services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
    #[error("Out of memory")]
    OutOfMemory,

    #[error("Invalid heap limits: gc_threshold ({gc_threshold}) exceeds max_bytes ({max_bytes})")]
    InvalidLimits { gc_threshold: usize, max_bytes: usize },

    #[error("Stale heap reference {0:?}: the cell was collected")]
    StaleReference(HeapId),

    #[error("Heap reference {id:?} is a {actual}, expected a {expected}")]
    WrongCellKind {
        id: HeapId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Atom bytes are not valid UTF-8")]
    InvalidUtf8,

    #[error("Script data already created: {0}")]
    AlreadyInitialized(&'static str),

    #[error("Script data missing: {0}")]
    NotInitialized(&'static str),

    #[error("Index {index} out of bounds for {what} of length {len}")]
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Script data is shared and can no longer be modified")]
    ScriptSealed,
}
