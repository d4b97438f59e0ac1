//! Error types for @UTF table parsing.

use crate::column::ColumnKind;
use cpk_storage::StorageError;
use thiserror::Error;

/// Result type for table operations.
pub type UtfResult<T> = Result<T, UtfError>;

/// Errors that can occur while analyzing or querying a table.
#[derive(Debug, Error)]
pub enum UtfError {
    /// No `@UTF` signature where a table was required.
    #[error("not a @UTF table at {offset:#010x} (found {found:02x?})")]
    BadSignature {
        /// Absolute offset that was probed.
        offset: u64,
        /// The four bytes found there.
        found: [u8; 4],
    },

    /// The per-row columns do not add up to the declared row width.
    #[error(
        "table at {offset:#010x}, row {row}: columns consume {actual} bytes but row width is {expected}"
    )]
    SchemaRowWidthMismatch {
        /// Absolute offset of the table.
        offset: u64,
        /// Row being decoded.
        row: u32,
        /// Declared row width.
        expected: u16,
        /// Bytes the schema consumes per row.
        actual: u64,
    },

    /// No column of that name exists in the requested row.
    #[error("table at {offset:#010x}, row {row}: column {name:?} not found")]
    ColumnNotFound {
        /// Absolute offset of the table.
        offset: u64,
        /// Requested row.
        row: u32,
        /// Requested column name.
        name: String,
    },

    /// The column exists but holds a different kind than requested.
    #[error("table at {offset:#010x}: column {name:?} is {found}, expected {expected}")]
    TypeMismatch {
        /// Absolute offset of the table.
        offset: u64,
        /// Column name.
        name: String,
        /// Kind the accessor accepts.
        expected: ColumnKind,
        /// Kind actually stored.
        found: ColumnKind,
    },

    /// The source ended in the middle of a read.
    #[error("unexpected end of input: {len} bytes at {offset:#010x}, source holds {size}")]
    UnexpectedEndOfInput {
        /// Absolute offset of the read.
        offset: u64,
        /// Requested length.
        len: usize,
        /// Size of the source.
        size: u64,
    },

    /// The type byte's high nibble is not a known storage class.
    #[error("unknown storage class in type byte {type_code:#04x} at {offset:#010x}")]
    UnknownStorageClass {
        /// Absolute offset of the schema entry.
        offset: u64,
        /// The full type byte.
        type_code: u8,
    },

    /// The type byte's low nibble is not a known column kind.
    #[error("unknown column type in type byte {type_code:#04x} at {offset:#010x}")]
    UnknownColumnType {
        /// Absolute offset of the schema entry.
        offset: u64,
        /// The full type byte.
        type_code: u8,
    },

    /// Header offsets describe an impossible layout.
    #[error("invalid table layout at {offset:#010x}: {message}")]
    InvalidLayout {
        /// Absolute offset of the table.
        offset: u64,
        /// Description of the problem.
        message: String,
    },

    /// A string reference points past the end of the string table.
    #[error("string offset {string_offset:#x} outside string table of {len} bytes")]
    StringOutOfRange {
        /// The offending string-table offset.
        string_offset: u32,
        /// Length of the string table.
        len: usize,
    },

    /// A row index beyond the table.
    #[error("row {row} out of range: table has {rows} rows")]
    RowOutOfRange {
        /// Requested row.
        row: u32,
        /// Rows in the table.
        rows: u32,
    },

    /// A computed absolute offset does not fit in 64 bits.
    #[error("value too large: {field} overflows at base {base:#x} + {value:#x}")]
    ValueTooLarge {
        /// Base the value was added to.
        base: u64,
        /// The value being added.
        value: u64,
        /// What was being computed.
        field: &'static str,
    },

    /// Storage backend error other than a short read.
    #[error("storage error: {0}")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for UtfError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ReadPastEnd { offset, len, size } => {
                Self::UnexpectedEndOfInput { offset, len, size }
            }
            other => Self::Storage(other),
        }
    }
}

impl UtfError {
    /// Create an invalid layout error.
    pub fn invalid_layout(offset: u64, message: impl Into<String>) -> Self {
        Self::InvalidLayout {
            offset,
            message: message.into(),
        }
    }
}

/// Adds `value` to `base`, failing with [`UtfError::ValueTooLarge`].
pub(crate) fn offset_add(base: u64, value: u64, field: &'static str) -> UtfResult<u64> {
    base.checked_add(value)
        .ok_or(UtfError::ValueTooLarge { base, value, field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_reads_become_end_of_input() {
        let err: UtfError = StorageError::ReadPastEnd {
            offset: 16,
            len: 4,
            size: 18,
        }
        .into();
        assert!(matches!(
            err,
            UtfError::UnexpectedEndOfInput {
                offset: 16,
                len: 4,
                size: 18
            }
        ));
    }

    #[test]
    fn other_storage_errors_are_wrapped() {
        let err: UtfError = StorageError::ReadOnly.into();
        assert!(matches!(err, UtfError::Storage(StorageError::ReadOnly)));
    }

    #[test]
    fn offset_overflow_is_reported() {
        assert_eq!(offset_add(1, 2, "x").unwrap(), 3);
        assert!(matches!(
            offset_add(u64::MAX, 1, "row"),
            Err(UtfError::ValueTooLarge { field: "row", .. })
        ));
    }
}
