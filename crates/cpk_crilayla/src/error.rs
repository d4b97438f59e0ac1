//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during compression or decompression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The container does not start with `CRILAYLA` or eight zero bytes.
    #[error("bad signature: expected CRILAYLA or zero magic, found {found:02x?}")]
    BadSignature {
        /// The eight bytes found at the start of the container.
        found: [u8; 8],
    },

    /// Declared sizes disagree with the bytes actually present.
    #[error("size mismatch: header declares {expected} bytes, container holds {actual}")]
    SizeMismatch {
        /// Length implied by the header fields.
        expected: u64,
        /// Length actually supplied.
        actual: u64,
    },

    /// The bitstream ran out while bits were still needed.
    #[error("unexpected end of input at stream offset {offset}")]
    UnexpectedEndOfInput {
        /// Byte offset (within the container) below which no data remains.
        offset: usize,
    },

    /// The payload is too small to be represented.
    #[error("input too small: {len} bytes, CRILAYLA needs more than {min}")]
    InputTooSmall {
        /// Length of the rejected payload.
        len: usize,
        /// Length that must be exceeded.
        min: usize,
    },

    /// A backreference points outside the bytes produced so far.
    #[error("invalid backreference at output position {position}: {message}")]
    InvalidBackreference {
        /// Output index the copy was writing to.
        position: usize,
        /// Description of the violation.
        message: String,
    },

    /// A size does not fit the 32-bit header field.
    #[error("value too large: {value} does not fit in {field}")]
    ValueTooLarge {
        /// The offending value.
        value: u64,
        /// The field it was destined for.
        field: &'static str,
    },
}

impl CodecError {
    /// Create an invalid backreference error.
    pub fn invalid_backreference(position: usize, message: impl Into<String>) -> Self {
        Self::InvalidBackreference {
            position,
            message: message.into(),
        }
    }
}
