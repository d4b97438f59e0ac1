//! Column schema entries.
//!
//! Each schema entry is a type byte followed by a big-endian string-table
//! offset naming the column. The type byte's high nibble selects the
//! storage class and its low nibble the value kind. Constant columns carry
//! their value bytes immediately after the name offset.

use crate::error::{UtfError, UtfResult};
use crate::value::TypedValue;
use serde::Serialize;
use std::fmt;

/// Mask selecting the storage class nibble.
pub const STORAGE_MASK: u8 = 0xF0;

/// Mask selecting the kind nibble.
pub const KIND_MASK: u8 = 0x0F;

/// How a column's value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    /// One value per row, consuming row bytes.
    PerRow,
    /// One value for the whole table, stored in the schema.
    Constant,
    /// No stored bytes; the value reads as zero.
    Zero,
}

impl StorageClass {
    /// Storage class code (already shifted into the high nibble).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::PerRow => 0x50,
            Self::Constant => 0x30,
            Self::Zero => 0x10,
        }
    }

    /// Classifies the high nibble of a type byte.
    #[must_use]
    pub const fn from_type_code(type_code: u8) -> Option<Self> {
        match type_code & STORAGE_MASK {
            0x50 => Some(Self::PerRow),
            0x30 => Some(Self::Constant),
            0x10 => Some(Self::Zero),
            _ => None,
        }
    }
}

/// The kind of value a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 64-bit integer.
    I64,
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
    /// Offset into the string table.
    String,
    /// `(offset, size)` into the data region.
    Data,
}

impl ColumnKind {
    /// Classifies the low nibble of a type byte.
    #[must_use]
    pub const fn from_type_code(type_code: u8) -> Option<Self> {
        Some(match type_code & KIND_MASK {
            0x0 => Self::U8,
            0x1 => Self::I8,
            0x2 => Self::U16,
            0x3 => Self::I16,
            0x4 => Self::U32,
            0x5 => Self::I32,
            0x6 => Self::U64,
            0x7 => Self::I64,
            0x8 => Self::F32,
            0x9 => Self::F64,
            0xA => Self::String,
            0xB => Self::Data,
            _ => return None,
        })
    }

    /// Kind code (the low nibble).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::U8 => 0x0,
            Self::I8 => 0x1,
            Self::U16 => 0x2,
            Self::I16 => 0x3,
            Self::U32 => 0x4,
            Self::I32 => 0x5,
            Self::U64 => 0x6,
            Self::I64 => 0x7,
            Self::F32 => 0x8,
            Self::F64 => 0x9,
            Self::String => 0xA,
            Self::Data => 0xB,
        }
    }

    /// Bytes one stored value occupies.
    #[must_use]
    pub const fn width(self) -> u8 {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 | Self::String => 4,
            Self::U64 | Self::I64 | Self::F64 | Self::Data => 8,
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One parsed schema entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    /// The raw type byte.
    pub type_code: u8,
    /// Storage class from the high nibble.
    pub storage: StorageClass,
    /// Value kind from the low nibble.
    pub kind: ColumnKind,
    /// String-table offset of the column name.
    pub name_offset: u32,
    /// The resolved column name.
    pub name: String,
    /// Absolute offset of the constant value, for constant columns.
    pub constant_offset: Option<u64>,
    /// The constant value, decoded once when the schema is read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constant: Option<TypedValue>,
}

impl ColumnSpec {
    /// Splits a type byte into storage class and kind.
    ///
    /// `offset` is the absolute position of the schema entry, used only
    /// for error reporting.
    pub fn classify(type_code: u8, offset: u64) -> UtfResult<(StorageClass, ColumnKind)> {
        let storage = StorageClass::from_type_code(type_code)
            .ok_or(UtfError::UnknownStorageClass { offset, type_code })?;
        let kind = ColumnKind::from_type_code(type_code)
            .ok_or(UtfError::UnknownColumnType { offset, type_code })?;
        Ok((storage, kind))
    }

    /// Row bytes this column consumes.
    #[must_use]
    pub fn row_bytes(&self) -> u64 {
        match self.storage {
            StorageClass::PerRow => u64::from(self.kind.width()),
            StorageClass::Constant | StorageClass::Zero => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_classes() {
        assert_eq!(StorageClass::from_type_code(0x5A), Some(StorageClass::PerRow));
        assert_eq!(StorageClass::from_type_code(0x34), Some(StorageClass::Constant));
        assert_eq!(StorageClass::from_type_code(0x16), Some(StorageClass::Zero));
        assert_eq!(StorageClass::from_type_code(0x74), None);
        assert_eq!(StorageClass::from_type_code(0x04), None);
    }

    #[test]
    fn kind_codes_roundtrip() {
        for code in 0..=0xBu8 {
            let kind = ColumnKind::from_type_code(0x50 | code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert_eq!(ColumnKind::from_type_code(0x5C), None);
        assert_eq!(ColumnKind::from_type_code(0x5F), None);
    }

    #[test]
    fn widths() {
        assert_eq!(ColumnKind::U8.width(), 1);
        assert_eq!(ColumnKind::I16.width(), 2);
        assert_eq!(ColumnKind::F32.width(), 4);
        assert_eq!(ColumnKind::String.width(), 4);
        assert_eq!(ColumnKind::Data.width(), 8);
        assert_eq!(ColumnKind::F64.width(), 8);
    }

    #[test]
    fn classify_reports_offending_nibble() {
        assert!(matches!(
            ColumnSpec::classify(0x44, 0x20),
            Err(UtfError::UnknownStorageClass {
                offset: 0x20,
                type_code: 0x44
            })
        ));
        assert!(matches!(
            ColumnSpec::classify(0x5D, 0x25),
            Err(UtfError::UnknownColumnType { type_code: 0x5D, .. })
        ));
    }

    #[test]
    fn only_per_row_columns_consume_row_bytes() {
        let spec = |type_code| {
            let (storage, kind) = ColumnSpec::classify(type_code, 0).unwrap();
            ColumnSpec {
                type_code,
                storage,
                kind,
                name_offset: 0,
                name: String::new(),
                constant_offset: None,
                constant: None,
            }
        };
        assert_eq!(spec(0x5B).row_bytes(), 8);
        assert_eq!(spec(0x3B).row_bytes(), 0);
        assert_eq!(spec(0x1B).row_bytes(), 0);
    }
}
