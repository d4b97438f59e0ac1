//! Decoded cell values.

use crate::column::ColumnKind;
use crate::error::UtfResult;
use crate::string_table::StringTable;
use serde::Serialize;
use std::fmt;

/// A string cell: its string-table offset and the decoded text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringRef {
    /// Offset into the string table.
    pub offset: u32,
    /// The resolved string.
    pub value: String,
}

/// A data cell: a byte range in the table's data region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DataRef {
    /// Offset relative to the start of the data region.
    pub offset: u32,
    /// Length of the range; zero means no data.
    pub size: u32,
}

impl DataRef {
    /// Whether the range is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// One decoded value, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    /// Kind 0.
    U8(u8),
    /// Kind 1.
    I8(i8),
    /// Kind 2.
    U16(u16),
    /// Kind 3.
    I16(i16),
    /// Kind 4.
    U32(u32),
    /// Kind 5.
    I32(i32),
    /// Kind 6.
    U64(u64),
    /// Kind 7.
    I64(i64),
    /// Kind 8.
    Float(f32),
    /// Kind 9.
    F64(f64),
    /// Kind 0xA.
    Str(StringRef),
    /// Kind 0xB.
    Data(DataRef),
}

impl TypedValue {
    /// The kind this value was decoded as.
    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        match self {
            Self::U8(_) => ColumnKind::U8,
            Self::I8(_) => ColumnKind::I8,
            Self::U16(_) => ColumnKind::U16,
            Self::I16(_) => ColumnKind::I16,
            Self::U32(_) => ColumnKind::U32,
            Self::I32(_) => ColumnKind::I32,
            Self::U64(_) => ColumnKind::U64,
            Self::I64(_) => ColumnKind::I64,
            Self::Float(_) => ColumnKind::F32,
            Self::F64(_) => ColumnKind::F64,
            Self::Str(_) => ColumnKind::String,
            Self::Data(_) => ColumnKind::Data,
        }
    }

    /// Decodes `raw` (exactly `kind.width()` big-endian bytes).
    pub fn decode(kind: ColumnKind, raw: &[u8], strings: &StringTable) -> UtfResult<Self> {
        Ok(match kind {
            ColumnKind::U8 => Self::U8(raw[0]),
            ColumnKind::I8 => Self::I8(i8::from_be_bytes(array(raw))),
            ColumnKind::U16 => Self::U16(u16::from_be_bytes(array(raw))),
            ColumnKind::I16 => Self::I16(i16::from_be_bytes(array(raw))),
            ColumnKind::U32 => Self::U32(u32::from_be_bytes(array(raw))),
            ColumnKind::I32 => Self::I32(i32::from_be_bytes(array(raw))),
            ColumnKind::U64 => Self::U64(u64::from_be_bytes(array(raw))),
            ColumnKind::I64 => Self::I64(i64::from_be_bytes(array(raw))),
            ColumnKind::F32 => Self::Float(f32::from_be_bytes(array(raw))),
            ColumnKind::F64 => Self::F64(f64::from_be_bytes(array(raw))),
            ColumnKind::String => {
                let offset = u32::from_be_bytes(array(raw));
                Self::Str(StringRef {
                    offset,
                    value: strings.get(offset)?,
                })
            }
            ColumnKind::Data => Self::Data(DataRef {
                offset: u32::from_be_bytes(array(&raw[..4])),
                size: u32::from_be_bytes(array(&raw[4..])),
            }),
        })
    }

    /// The value a zero-storage column of `kind` reads as.
    ///
    /// Strings resolve offset 0 through `strings`, like any stored offset.
    pub fn zero(kind: ColumnKind, strings: &StringTable) -> UtfResult<Self> {
        Ok(match kind {
            ColumnKind::U8 => Self::U8(0),
            ColumnKind::I8 => Self::I8(0),
            ColumnKind::U16 => Self::U16(0),
            ColumnKind::I16 => Self::I16(0),
            ColumnKind::U32 => Self::U32(0),
            ColumnKind::I32 => Self::I32(0),
            ColumnKind::U64 => Self::U64(0),
            ColumnKind::I64 => Self::I64(0),
            ColumnKind::F32 => Self::Float(0.0),
            ColumnKind::F64 => Self::F64(0.0),
            ColumnKind::String => Self::Str(StringRef {
                offset: 0,
                value: strings.get(0)?,
            }),
            ColumnKind::Data => Self::Data(DataRef { offset: 0, size: 0 }),
        })
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v:#x}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "\"{}\"", s.value),
            Self::Data(d) => write!(f, "[{:#010x}] (size {:#010x})", d.offset, d.size),
        }
    }
}

fn array<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&raw[..N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings() -> StringTable {
        StringTable::new(b"<NULL>\0name\0".to_vec())
    }

    #[test]
    fn integers_are_big_endian() {
        let s = strings();
        assert_eq!(
            TypedValue::decode(ColumnKind::U16, &[0x12, 0x34], &s).unwrap(),
            TypedValue::U16(0x1234)
        );
        assert_eq!(
            TypedValue::decode(ColumnKind::I32, &[0xFF, 0xFF, 0xFF, 0xFE], &s).unwrap(),
            TypedValue::I32(-2)
        );
        assert_eq!(
            TypedValue::decode(ColumnKind::U64, &[0, 0, 0, 0, 0, 0, 1, 0], &s).unwrap(),
            TypedValue::U64(256)
        );
    }

    #[test]
    fn float_reinterprets_bits() {
        let raw = 1.5f32.to_be_bytes();
        assert_eq!(
            TypedValue::decode(ColumnKind::F32, &raw, &strings()).unwrap(),
            TypedValue::Float(1.5)
        );
    }

    #[test]
    fn strings_resolve_through_table() {
        let value = TypedValue::decode(ColumnKind::String, &[0, 0, 0, 7], &strings()).unwrap();
        assert_eq!(
            value,
            TypedValue::Str(StringRef {
                offset: 7,
                value: "name".into()
            })
        );
        assert_eq!(value.to_string(), "\"name\"");
    }

    #[test]
    fn data_is_offset_then_size() {
        let value =
            TypedValue::decode(ColumnKind::Data, &[0, 0, 0, 0x10, 0, 0, 0, 0x20], &strings())
                .unwrap();
        assert_eq!(value, TypedValue::Data(DataRef { offset: 0x10, size: 0x20 }));
        assert_eq!(value.to_string(), "[0x00000010] (size 0x00000020)");
    }

    #[test]
    fn zero_values_match_kind() {
        let s = strings();
        for code in 0..=0xB {
            let kind = ColumnKind::from_type_code(code).unwrap();
            assert_eq!(TypedValue::zero(kind, &s).unwrap().kind(), kind);
        }
    }

    #[test]
    fn zero_string_reads_offset_zero() {
        assert_eq!(
            TypedValue::zero(ColumnKind::String, &strings()).unwrap(),
            TypedValue::Str(StringRef {
                offset: 0,
                value: "<NULL>".into()
            })
        );
        let empty = StringTable::default();
        assert!(matches!(
            TypedValue::zero(ColumnKind::String, &empty).unwrap(),
            TypedValue::Str(StringRef { ref value, .. }) if value.is_empty()
        ));
    }

    #[test]
    fn u64_displays_as_hex() {
        assert_eq!(TypedValue::U64(0x800).to_string(), "0x800");
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_string(&TypedValue::U32(5)).unwrap();
        assert_eq!(json, r#"{"type":"u32","value":5}"#);
    }
}
