//! Error types for archive walking and extraction.

use std::io;
use thiserror::Error;

/// Result type for archive operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while reading or unpacking a CPK archive.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] cpk_storage::StorageError),

    /// CRILAYLA codec error.
    #[error("codec error: {0}")]
    Codec(#[from] cpk_crilayla::CodecError),

    /// `@UTF` table error.
    #[error("table error: {0}")]
    Utf(#[from] cpk_utf::UtfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A `CPK ` or `TOC ` signature is missing.
    #[error("{expected} signature not found at {offset:#x}: found {found:02x?}")]
    BadSignature {
        /// Which signature was expected.
        expected: &'static str,
        /// Where it was expected.
        offset: u64,
        /// The bytes actually found.
        found: [u8; 4],
    },

    /// A table has a different number of rows than required.
    #[error("{table} at {offset:#x} has {actual} rows, expected {expected}")]
    RowCountMismatch {
        /// Table name.
        table: String,
        /// Table offset.
        offset: u64,
        /// Rows required.
        expected: u64,
        /// Rows present.
        actual: u32,
    },

    /// A decompressed entry is not as long as its `ExtractSize`.
    #[error("{path}: uncompressed to {actual} bytes, ExtractSize is {expected}")]
    ExtractSizeMismatch {
        /// Entry path inside the archive.
        path: String,
        /// `ExtractSize` column.
        expected: u64,
        /// Bytes produced.
        actual: u64,
    },

    /// A computed offset or size is outside the addressable range.
    #[error("{field} too large: {value:#x} exceeds {limit:#x}")]
    ValueTooLarge {
        /// What was being computed.
        field: &'static str,
        /// The offending value; saturated when the computation overflowed.
        value: u64,
        /// Largest acceptable value.
        limit: u64,
    },

    /// An entry path cannot be placed under the output directory.
    #[error("invalid entry path {path:?}: {reason}")]
    InvalidPath {
        /// The path as recorded in the archive.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl CoreError {
    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    /// Creates a value too large error.
    pub fn value_too_large(field: &'static str, value: u64, limit: u64) -> Self {
        Self::ValueTooLarge {
            field,
            value,
            limit,
        }
    }
}
