//! Error types for safetensors container operations.

use thiserror::Error;

/// All errors that can occur when reading or writing a tensor container.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from an underlying file or sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blob ends before the length prefix or the header it announces.
    #[error("Truncated header: need {needed} bytes, only {available} available")]
    TruncatedHeader { needed: u64, available: u64 },

    /// The announced header length exceeds the configured ceiling.
    #[error("Header size {size} exceeds limit of {limit} bytes")]
    HeaderTooLarge { size: u64, limit: u64 },

    /// Header is not valid JSON or does not follow the entry schema.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Header serialization failed.
    #[error("Header encoding error: {0}")]
    HeaderEncode(#[source] serde_json::Error),

    /// An entry's data offsets fall outside the payload or leave a gap.
    #[error("Invalid offsets for '{name}': {reason}")]
    InvalidOffsets { name: String, reason: String },

    /// Two entries claim overlapping payload ranges.
    #[error("Tensors '{first}' and '{second}' have overlapping data ranges")]
    OverlappingTensors { first: String, second: String },

    /// Byte length disagrees with `product(shape) * dtype.size()`.
    #[error("Shape mismatch for '{name}': expected {expected} bytes, found {found} bytes")]
    ShapeMismatch {
        name: String,
        expected: u64,
        found: u64,
    },

    /// Requested tensor is not in the header.
    #[error("Tensor not found: {0}")]
    NotFound(String),

    /// Writer was configured to reject an empty tensor set.
    #[error("No tensors to write")]
    EmptyInput,

    /// Writer input repeats a tensor name.
    #[error("Duplicate tensor name: '{0}'")]
    DuplicateName(String),

    /// Tensor name is empty or reserved.
    #[error("Invalid tensor name: {0:?}")]
    InvalidName(String),

    /// Element type does not match the stored dtype.
    #[error("Type mismatch in {context}: expected '{expected}', found '{found}'")]
    TypeMismatch {
        expected: String,
        found: String,
        context: String,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
