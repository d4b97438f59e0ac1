//! Table analysis: header, schema and string table.
//!
//! ```text
//! +0x00  "@UTF"
//! +0x04  u32 BE  table size (bytes after this field's end)
//! +0x08  u32 BE  rows offset          \
//! +0x0C  u32 BE  string table offset   | relative to table + 8
//! +0x10  u32 BE  data offset          /
//! +0x14  u32 BE  table name (string table offset)
//! +0x18  u16 BE  column count
//! +0x1A  u16 BE  row width
//! +0x1C  u32 BE  row count
//! +0x20  schema entries
//! ```

use crate::column::{ColumnSpec, StorageClass};
use crate::error::{offset_add, UtfError, UtfResult};
use crate::string_table::StringTable;
use crate::value::{DataRef, TypedValue};
use cpk_storage::{ReadAtExt, StorageBackend, StorageError};
use serde::Serialize;
use tracing::debug;

/// Signature at the start of every table.
pub const SIGNATURE: [u8; 4] = *b"@UTF";

/// Offset of the first schema entry from the signature.
pub const SCHEMA_OFFSET: u64 = 0x20;

/// Header offsets are relative to this many bytes past the signature.
const BASE_SKIP: u64 = 8;

/// The fixed table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableHeader {
    /// Bytes following the size field.
    pub table_size: u32,
    /// Start of row data, relative to the table base.
    pub rows_offset: u32,
    /// Start of the string table, relative to the table base.
    pub string_table_offset: u32,
    /// Start of the data region, relative to the table base.
    pub data_offset: u32,
    /// String-table offset of the table name.
    pub name_offset: u32,
    /// Number of schema entries.
    pub columns: u16,
    /// Stride between rows.
    pub row_width: u16,
    /// Number of rows.
    pub rows: u32,
}

impl TableHeader {
    fn from_bytes(raw: &[u8; 0x1C]) -> Self {
        let u32_at = |at: usize| u32::from_be_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        let u16_at = |at: usize| u16::from_be_bytes([raw[at], raw[at + 1]]);
        Self {
            table_size: u32_at(0x00),
            rows_offset: u32_at(0x04),
            string_table_offset: u32_at(0x08),
            data_offset: u32_at(0x0C),
            name_offset: u32_at(0x10),
            columns: u16_at(0x14),
            row_width: u16_at(0x16),
            rows: u32_at(0x18),
        }
    }
}

/// A parsed table.
///
/// Holds the header, schema and string table. Row values are decoded on
/// demand from the source the table was analyzed from.
#[derive(Debug, Clone)]
pub struct UtfTable {
    offset: u64,
    header: TableHeader,
    name: String,
    schema: Vec<ColumnSpec>,
    strings: StringTable,
}

/// Parses the table at `offset`.
///
/// # Errors
///
/// Fails with [`UtfError::BadSignature`] if no `@UTF` signature is present,
/// and with the relevant error for any malformed header or schema.
pub fn analyze<S: StorageBackend + ?Sized>(source: &S, offset: u64) -> UtfResult<UtfTable> {
    let found: [u8; 4] = source.read_array_at(offset)?;
    if found != SIGNATURE {
        return Err(UtfError::BadSignature { offset, found });
    }
    UtfTable::parse(source, offset)
}

/// Parses the table at `offset` if one is there.
///
/// Returns `Ok(None)` when the bytes at `offset` are not a `@UTF`
/// signature, including when fewer than four bytes remain.
pub fn probe<S: StorageBackend + ?Sized>(source: &S, offset: u64) -> UtfResult<Option<UtfTable>> {
    let found: [u8; 4] = match source.read_array_at(offset) {
        Ok(found) => found,
        Err(StorageError::ReadPastEnd { .. }) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if found != SIGNATURE {
        debug!(offset, "no @UTF signature");
        return Ok(None);
    }
    UtfTable::parse(source, offset).map(Some)
}

/// Loads only the string table of the table at `offset`.
pub fn load_string_table<S: StorageBackend + ?Sized>(
    source: &S,
    offset: u64,
) -> UtfResult<StringTable> {
    Ok(analyze(source, offset)?.strings)
}

impl UtfTable {
    fn parse<S: StorageBackend + ?Sized>(source: &S, offset: u64) -> UtfResult<Self> {
        let raw: [u8; 0x1C] = source.read_array_at(offset_add(offset, 4, "table header")?)?;
        let header = TableHeader::from_bytes(&raw);

        if header.string_table_offset > header.data_offset {
            return Err(UtfError::invalid_layout(
                offset,
                format!(
                    "string table offset {:#x} lies past data offset {:#x}",
                    header.string_table_offset, header.data_offset
                ),
            ));
        }

        // Constant values sit inline in the schema; keep their raw bytes
        // until the string table is available to resolve them.
        let mut cursor = offset_add(offset, SCHEMA_OFFSET, "schema")?;
        let mut entries = Vec::with_capacity(usize::from(header.columns));
        for _ in 0..header.columns {
            let entry_offset = cursor;
            let type_code = source.read_u8_at(cursor)?;
            let name_offset = source.read_u32_be_at(offset_add(cursor, 1, "schema entry")?)?;
            cursor = offset_add(cursor, 5, "schema entry")?;

            let (storage, kind) = ColumnSpec::classify(type_code, entry_offset)?;
            let constant = if storage == StorageClass::Constant {
                let width = u64::from(kind.width());
                let bytes = source.read_at(cursor, usize::from(kind.width()))?;
                let at = cursor;
                cursor = offset_add(cursor, width, "constant value")?;
                Some((at, bytes))
            } else {
                None
            };
            entries.push((type_code, storage, kind, name_offset, constant));
        }

        let base = offset_add(offset, BASE_SKIP, "table base")?;
        let strings_at = offset_add(base, u64::from(header.string_table_offset), "string table")?;
        let strings_len = (header.data_offset - header.string_table_offset) as usize;
        let strings = StringTable::new(source.read_at(strings_at, strings_len)?);

        let name = strings.get(header.name_offset)?;
        let mut schema = Vec::with_capacity(entries.len());
        for (type_code, storage, kind, name_offset, constant) in entries {
            let (constant_offset, constant) = match constant {
                Some((at, bytes)) => (Some(at), Some(TypedValue::decode(kind, &bytes, &strings)?)),
                None => (None, None),
            };
            schema.push(ColumnSpec {
                type_code,
                storage,
                kind,
                name_offset,
                name: strings.get(name_offset)?,
                constant_offset,
                constant,
            });
        }

        debug!(
            offset,
            name = %name,
            rows = header.rows,
            columns = header.columns,
            row_width = header.row_width,
            "analyzed @UTF table"
        );

        Ok(Self {
            offset,
            header,
            name,
            schema,
            strings,
        })
    }

    /// Absolute offset of the signature.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The fixed header fields.
    #[must_use]
    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    /// The table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.header.rows
    }

    /// Number of columns.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.schema.len()
    }

    /// Declared stride between rows.
    #[must_use]
    pub fn row_width(&self) -> u16 {
        self.header.row_width
    }

    /// The schema in storage order.
    #[must_use]
    pub fn schema(&self) -> &[ColumnSpec] {
        &self.schema
    }

    /// The string table.
    #[must_use]
    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Resolves a string-table offset.
    pub fn string(&self, offset: u32) -> UtfResult<String> {
        self.strings.get(offset)
    }

    /// Position of the column called `name`; the last one wins when
    /// names repeat.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.iter().rposition(|c| c.name == name)
    }

    /// The column called `name`, with the same tie rule as
    /// [`column_index`](Self::column_index).
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.column_index(name).map(|i| &self.schema[i])
    }

    /// Row bytes the schema consumes.
    #[must_use]
    pub fn schema_row_width(&self) -> u64 {
        self.schema.iter().map(ColumnSpec::row_bytes).sum()
    }

    /// Absolute offset of the first row.
    pub fn rows_start(&self) -> UtfResult<u64> {
        offset_add(
            self.offset + BASE_SKIP,
            u64::from(self.header.rows_offset),
            "rows",
        )
    }

    /// Absolute offset of the data region.
    pub fn data_start(&self) -> UtfResult<u64> {
        offset_add(
            self.offset + BASE_SKIP,
            u64::from(self.header.data_offset),
            "data region",
        )
    }

    /// Absolute offset of the bytes a data cell refers to.
    pub fn data_offset(&self, data: &DataRef) -> UtfResult<u64> {
        offset_add(self.data_start()?, u64::from(data.offset), "data cell")
    }

    /// Reads the bytes a data cell refers to.
    pub fn read_data<S: StorageBackend + ?Sized>(
        &self,
        source: &S,
        data: &DataRef,
    ) -> UtfResult<Vec<u8>> {
        Ok(source.read_at(self.data_offset(data)?, data.size as usize)?)
    }

    /// Analyzes the table a data cell refers to, if it holds one.
    ///
    /// Returns `Ok(None)` for empty cells and for bytes that do not start
    /// with a `@UTF` signature.
    pub fn nested<S: StorageBackend + ?Sized>(
        &self,
        source: &S,
        data: &DataRef,
    ) -> UtfResult<Option<UtfTable>> {
        if data.is_empty() {
            return Ok(None);
        }
        probe(source, self.data_offset(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpk_storage::InMemoryBackend;
    use cpk_testkit::{kind, FixtureValue, UtfTableBuilder};

    fn at(offset: usize, table: Vec<u8>) -> InMemoryBackend {
        let mut bytes = vec![0xEE; offset];
        bytes.extend(table);
        InMemoryBackend::with_data(bytes)
    }

    #[test]
    fn empty_table_parses() {
        let source = at(0, UtfTableBuilder::new("Empty").build());
        let table = analyze(&source, 0).unwrap();
        assert_eq!(table.name(), "Empty");
        assert_eq!(table.rows(), 0);
        assert_eq!(table.columns(), 0);
        assert_eq!(table.row_width(), 0);
    }

    #[test]
    fn header_fields_are_big_endian() {
        let bytes = UtfTableBuilder::new("T")
            .column("a", kind::U32)
            .column("b", kind::U16)
            .row(vec![FixtureValue::U32(1), FixtureValue::U16(2)])
            .row(vec![FixtureValue::U32(3), FixtureValue::U16(4)])
            .build();
        let source = at(0x40, bytes);
        let table = analyze(&source, 0x40).unwrap();

        assert_eq!(table.offset(), 0x40);
        assert_eq!(table.rows(), 2);
        assert_eq!(table.row_width(), 6);
        assert_eq!(table.header().rows_offset, 0x18 + 10);
        assert_eq!(table.rows_start().unwrap(), 0x40 + 8 + 0x18 + 10);
        assert_eq!(table.schema_row_width(), 6);
    }

    #[test]
    fn schema_resolves_names_and_constants() {
        let bytes = UtfTableBuilder::new("T")
            .column("id", kind::U32)
            .constant("align", FixtureValue::U16(0x800))
            .constant("label", FixtureValue::str("fixed"))
            .zero("unused", kind::U64)
            .build();
        let source = at(0, bytes);
        let table = analyze(&source, 0).unwrap();

        let names: Vec<&str> = table.schema().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "align", "label", "unused"]);

        let align = table.column("align").unwrap();
        assert_eq!(align.storage, StorageClass::Constant);
        // type byte + name offset of "id", then this entry's own 5 bytes
        assert_eq!(align.constant_offset, Some(SCHEMA_OFFSET + 5 + 5));
        assert_eq!(align.constant, Some(TypedValue::U16(0x800)));

        let label = table.column("label").unwrap();
        assert!(matches!(&label.constant, Some(TypedValue::Str(s)) if s.value == "fixed"));

        assert_eq!(table.column("unused").unwrap().storage, StorageClass::Zero);
        assert_eq!(table.column_index("unused"), Some(3));
        assert_eq!(table.column_index("missing"), None);
    }

    #[test]
    fn wrong_signature() {
        let source = InMemoryBackend::with_data(b"@UTX\0\0\0\0".to_vec());
        assert!(matches!(
            analyze(&source, 0),
            Err(UtfError::BadSignature { offset: 0, found }) if &found == b"@UTX"
        ));
        assert!(probe(&source, 0).unwrap().is_none());
    }

    #[test]
    fn probe_near_end_is_not_a_table() {
        let source = InMemoryBackend::with_data(b"@U".to_vec());
        assert!(probe(&source, 0).unwrap().is_none());
        assert!(matches!(
            analyze(&source, 0),
            Err(UtfError::UnexpectedEndOfInput { .. })
        ));
    }

    #[test]
    fn truncated_header_is_end_of_input() {
        let bytes = UtfTableBuilder::new("T").build();
        let source = InMemoryBackend::with_data(bytes[..0x10].to_vec());
        assert!(matches!(
            analyze(&source, 0),
            Err(UtfError::UnexpectedEndOfInput { .. })
        ));
    }

    #[test]
    fn unknown_type_is_rejected_at_schema_parse() {
        let bytes = UtfTableBuilder::new("T")
            .column_with_code("bad", 0x5C)
            .build();
        let source = at(0, bytes);
        assert!(matches!(
            analyze(&source, 0),
            Err(UtfError::UnknownColumnType {
                offset: SCHEMA_OFFSET,
                type_code: 0x5C
            })
        ));
    }

    #[test]
    fn unknown_storage_is_rejected() {
        let bytes = UtfTableBuilder::new("T")
            .column_with_code("bad", 0x74)
            .build();
        let source = at(0, bytes);
        assert!(matches!(
            analyze(&source, 0),
            Err(UtfError::UnknownStorageClass { type_code: 0x74, .. })
        ));
    }

    #[test]
    fn inverted_regions_are_invalid() {
        let mut bytes = UtfTableBuilder::new("T").build();
        // string table offset beyond data offset
        bytes[12..16].copy_from_slice(&0x100u32.to_be_bytes());
        let source = at(0, bytes);
        assert!(matches!(
            analyze(&source, 0),
            Err(UtfError::InvalidLayout { offset: 0, .. })
        ));
    }

    #[test]
    fn bad_name_offset_is_out_of_range() {
        let mut bytes = UtfTableBuilder::new("T").build();
        bytes[20..24].copy_from_slice(&0x400u32.to_be_bytes());
        let source = at(0, bytes);
        assert!(matches!(
            analyze(&source, 0),
            Err(UtfError::StringOutOfRange {
                string_offset: 0x400,
                ..
            })
        ));
    }

    #[test]
    fn nested_table_is_found_through_data_cell() {
        let inner = UtfTableBuilder::new("Inner")
            .column("v", kind::U8)
            .row(vec![FixtureValue::U8(9)])
            .build();
        let outer = UtfTableBuilder::new("Outer")
            .column("blob", kind::DATA)
            .column("raw", kind::DATA)
            .column("none", kind::DATA)
            .row(vec![
                FixtureValue::Data(inner),
                FixtureValue::Data(b"plain bytes".to_vec()),
                FixtureValue::Data(Vec::new()),
            ])
            .build();
        let source = at(0x10, outer);
        let table = analyze(&source, 0x10).unwrap();
        let row = table.row(&source, 0).unwrap();

        let data = |i: usize| match row.cells[i].value {
            TypedValue::Data(d) => d,
            ref other => panic!("expected data, got {other:?}"),
        };

        let nested = table.nested(&source, &data(0)).unwrap().unwrap();
        assert_eq!(nested.name(), "Inner");
        assert_eq!(nested.offset(), table.data_start().unwrap());

        assert!(table.nested(&source, &data(1)).unwrap().is_none());
        assert_eq!(table.read_data(&source, &data(1)).unwrap(), b"plain bytes");
        assert!(table.nested(&source, &data(2)).unwrap().is_none());
    }

    #[test]
    fn string_table_loads_alone() {
        let bytes = UtfTableBuilder::new("Names").column("n", kind::STRING).build();
        let source = at(0, bytes);
        let strings = load_string_table(&source, 0).unwrap();
        assert_eq!(strings.as_bytes(), b"<NULL>\0Names\0n\0");
    }

    #[test]
    fn repeated_names_resolve_to_last_column() {
        let bytes = UtfTableBuilder::new("T")
            .column("n", kind::U8)
            .column("other", kind::U8)
            .column("n", kind::U16)
            .build();
        let source = at(0, bytes);
        let table = analyze(&source, 0).unwrap();
        assert_eq!(table.column_index("n"), Some(2));
        assert_eq!(table.column("n").unwrap().kind, crate::ColumnKind::U16);
    }
}
