//! Byte-level builders for @UTF tables and CPK images.
//!
//! The builders write the on-disk layout directly, so tests can produce
//! well-formed inputs as well as deliberately corrupt ones without going
//! through the crates under test.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Low-nibble column kind codes.
pub mod kind {
    /// Unsigned 8-bit integer.
    pub const U8: u8 = 0x0;
    /// Signed 8-bit integer.
    pub const I8: u8 = 0x1;
    /// Unsigned 16-bit integer.
    pub const U16: u8 = 0x2;
    /// Signed 16-bit integer.
    pub const I16: u8 = 0x3;
    /// Unsigned 32-bit integer.
    pub const U32: u8 = 0x4;
    /// Signed 32-bit integer.
    pub const I32: u8 = 0x5;
    /// Unsigned 64-bit integer.
    pub const U64: u8 = 0x6;
    /// Signed 64-bit integer.
    pub const I64: u8 = 0x7;
    /// 32-bit float.
    pub const F32: u8 = 0x8;
    /// 64-bit float.
    pub const F64: u8 = 0x9;
    /// String-table reference.
    pub const STRING: u8 = 0xA;
    /// `(offset, size)` into the data region.
    pub const DATA: u8 = 0xB;
}

/// High-nibble storage class for columns stored as undefined zero.
pub const STORAGE_ZERO: u8 = 0x10;
/// High-nibble storage class for table-wide constants.
pub const STORAGE_CONSTANT: u8 = 0x30;
/// High-nibble storage class for per-row values.
pub const STORAGE_PER_ROW: u8 = 0x50;

/// Bytes a value of `kind` occupies, or 0 for unknown kinds.
#[must_use]
pub const fn kind_width(kind: u8) -> u16 {
    match kind {
        kind::U8 | kind::I8 => 1,
        kind::U16 | kind::I16 => 2,
        kind::U32 | kind::I32 | kind::F32 | kind::STRING => 4,
        kind::U64 | kind::I64 | kind::F64 | kind::DATA => 8,
        _ => 0,
    }
}

/// A cell value as it should appear in a built table.
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureValue {
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
    F32(f32),
    /// Kind 9.
    F64(f64),
    /// Interned into the string table.
    Str(String),
    /// Appended to the data region; an empty blob is written as `(0, 0)`.
    Data(Vec<u8>),
}

impl FixtureValue {
    /// Shorthand for [`FixtureValue::Str`].
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// The column kind code for this value.
    #[must_use]
    pub fn kind(&self) -> u8 {
        match self {
            Self::U8(_) => kind::U8,
            Self::I8(_) => kind::I8,
            Self::U16(_) => kind::U16,
            Self::I16(_) => kind::I16,
            Self::U32(_) => kind::U32,
            Self::I32(_) => kind::I32,
            Self::U64(_) => kind::U64,
            Self::I64(_) => kind::I64,
            Self::F32(_) => kind::F32,
            Self::F64(_) => kind::F64,
            Self::Str(_) => kind::STRING,
            Self::Data(_) => kind::DATA,
        }
    }
}

#[derive(Debug, Clone)]
struct ColumnDef {
    name: String,
    code: u8,
    constant: Option<FixtureValue>,
}

/// Builds the raw bytes of one @UTF table.
///
/// # Example
///
/// ```rust
/// use cpk_testkit::{kind, FixtureValue, UtfTableBuilder};
///
/// let bytes = UtfTableBuilder::new("Sample")
///     .column("Id", kind::U32)
///     .column("Label", kind::STRING)
///     .row(vec![FixtureValue::U32(7), FixtureValue::str("seven")])
///     .build();
/// assert_eq!(&bytes[..4], b"@UTF");
/// ```
#[derive(Debug, Clone)]
pub struct UtfTableBuilder {
    name: String,
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<FixtureValue>>,
    row_width: Option<u16>,
}

impl UtfTableBuilder {
    /// Starts a table called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            row_width: None,
        }
    }

    /// Adds a per-row column of `kind`.
    #[must_use]
    pub fn column(self, name: impl Into<String>, kind: u8) -> Self {
        self.column_with_code(name, STORAGE_PER_ROW | kind)
    }

    /// Adds a column with a constant value stored in the schema.
    #[must_use]
    pub fn constant(mut self, name: impl Into<String>, value: FixtureValue) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            code: STORAGE_CONSTANT | value.kind(),
            constant: Some(value),
        });
        self
    }

    /// Adds a zero-storage column of `kind`.
    #[must_use]
    pub fn zero(self, name: impl Into<String>, kind: u8) -> Self {
        self.column_with_code(name, STORAGE_ZERO | kind)
    }

    /// Adds a column with an arbitrary type byte and no constant bytes.
    #[must_use]
    pub fn column_with_code(mut self, name: impl Into<String>, code: u8) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            code,
            constant: None,
        });
        self
    }

    /// Appends a row holding one value per per-row column, in schema order.
    #[must_use]
    pub fn row(mut self, values: Vec<FixtureValue>) -> Self {
        self.rows.push(values);
        self
    }

    /// Overrides the declared row width.
    #[must_use]
    pub fn row_width(mut self, width: u16) -> Self {
        self.row_width = Some(width);
        self
    }

    /// Sum of the widths of the per-row columns.
    #[must_use]
    pub fn schema_row_width(&self) -> u16 {
        self.columns
            .iter()
            .filter(|c| c.code & 0xF0 == STORAGE_PER_ROW)
            .map(|c| kind_width(c.code & 0x0F))
            .sum()
    }

    /// Serializes the table.
    ///
    /// # Panics
    ///
    /// Panics if a row does not supply exactly one value of the declared
    /// kind for every per-row column.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut heap = Heap::default();
        heap.intern("<NULL>");
        let name_offset = heap.intern(&self.name);

        let mut schema = Vec::new();
        for column in &self.columns {
            schema.push(column.code);
            let column_name = heap.intern(&column.name);
            schema.extend_from_slice(&column_name.to_be_bytes());
            if let Some(value) = &column.constant {
                heap.encode(value, &mut schema);
            }
        }

        let per_row: Vec<&ColumnDef> = self
            .columns
            .iter()
            .filter(|c| c.code & 0xF0 == STORAGE_PER_ROW)
            .collect();

        let mut rows = Vec::new();
        for (index, values) in self.rows.iter().enumerate() {
            assert_eq!(
                values.len(),
                per_row.len(),
                "row {index} needs one value per per-row column"
            );
            for (column, value) in per_row.iter().zip(values) {
                assert_eq!(
                    column.code & 0x0F,
                    value.kind(),
                    "row {index}, column {}: value kind does not match",
                    column.name
                );
                heap.encode(value, &mut rows);
            }
        }

        let rows_offset = 0x18 + schema.len() as u32;
        let string_table_offset = rows_offset + rows.len() as u32;
        let data_offset = string_table_offset + heap.strings.len() as u32;
        let table_size = data_offset + heap.data.len() as u32;
        let row_width = self.row_width.unwrap_or_else(|| self.schema_row_width());

        let mut out = Vec::with_capacity(8 + table_size as usize);
        out.extend_from_slice(b"@UTF");
        out.extend_from_slice(&table_size.to_be_bytes());
        out.extend_from_slice(&rows_offset.to_be_bytes());
        out.extend_from_slice(&string_table_offset.to_be_bytes());
        out.extend_from_slice(&data_offset.to_be_bytes());
        out.extend_from_slice(&name_offset.to_be_bytes());
        out.extend_from_slice(&(self.columns.len() as u16).to_be_bytes());
        out.extend_from_slice(&row_width.to_be_bytes());
        out.extend_from_slice(&(self.rows.len() as u32).to_be_bytes());
        out.extend_from_slice(&schema);
        out.extend_from_slice(&rows);
        out.extend_from_slice(&heap.strings);
        out.extend_from_slice(&heap.data);
        out
    }
}

/// String table and data region under construction.
#[derive(Default)]
struct Heap {
    strings: Vec<u8>,
    interned: HashMap<String, u32>,
    data: Vec<u8>,
}

impl Heap {
    fn intern(&mut self, value: &str) -> u32 {
        if let Some(&offset) = self.interned.get(value) {
            return offset;
        }
        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        self.interned.insert(value.to_owned(), offset);
        offset
    }

    fn encode(&mut self, value: &FixtureValue, out: &mut Vec<u8>) {
        match value {
            FixtureValue::U8(v) => out.push(*v),
            FixtureValue::I8(v) => out.extend_from_slice(&v.to_be_bytes()),
            FixtureValue::U16(v) => out.extend_from_slice(&v.to_be_bytes()),
            FixtureValue::I16(v) => out.extend_from_slice(&v.to_be_bytes()),
            FixtureValue::U32(v) => out.extend_from_slice(&v.to_be_bytes()),
            FixtureValue::I32(v) => out.extend_from_slice(&v.to_be_bytes()),
            FixtureValue::U64(v) => out.extend_from_slice(&v.to_be_bytes()),
            FixtureValue::I64(v) => out.extend_from_slice(&v.to_be_bytes()),
            FixtureValue::F32(v) => out.extend_from_slice(&v.to_be_bytes()),
            FixtureValue::F64(v) => out.extend_from_slice(&v.to_be_bytes()),
            FixtureValue::Str(s) => {
                let offset = self.intern(s);
                out.extend_from_slice(&offset.to_be_bytes());
            }
            FixtureValue::Data(blob) => {
                let (offset, size) = if blob.is_empty() {
                    (0, 0)
                } else {
                    let offset = self.data.len() as u32;
                    self.data.extend_from_slice(blob);
                    (offset, blob.len() as u32)
                };
                out.extend_from_slice(&offset.to_be_bytes());
                out.extend_from_slice(&size.to_be_bytes());
            }
        }
    }
}

/// One file to place in a built archive.
#[derive(Debug, Clone)]
pub struct CpkFile {
    /// `DirName` column; empty for the archive root.
    pub dir: String,
    /// `FileName` column.
    pub name: String,
    /// Bytes stored in the archive (a CRILAYLA container for packed files).
    pub stored: Vec<u8>,
    /// `ExtractSize` column.
    pub extract_size: u32,
}

/// Where the content region sits relative to the TOC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CpkLayout {
    /// `CPK ` header, TOC, then file content.
    #[default]
    TocFirst,
    /// `CPK ` header, file content, then TOC.
    ContentFirst,
}

/// Builds a minimal CPK image: header table, TOC table and content.
#[derive(Debug, Clone, Default)]
pub struct CpkImageBuilder {
    files: Vec<CpkFile>,
    layout: CpkLayout,
    declared_files: Option<u32>,
}

const ALIGN: u64 = 0x10;

impl CpkImageBuilder {
    /// Starts an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file stored uncompressed.
    #[must_use]
    pub fn file(self, dir: impl Into<String>, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let extract_size = bytes.len() as u32;
        self.stored(dir, name, bytes, extract_size)
    }

    /// Adds a file with explicit stored bytes and extract size.
    #[must_use]
    pub fn stored(
        mut self,
        dir: impl Into<String>,
        name: impl Into<String>,
        stored: Vec<u8>,
        extract_size: u32,
    ) -> Self {
        self.files.push(CpkFile {
            dir: dir.into(),
            name: name.into(),
            stored,
            extract_size,
        });
        self
    }

    /// Selects the region order.
    #[must_use]
    pub fn layout(mut self, layout: CpkLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Overrides the `Files` count written to the header table.
    #[must_use]
    pub fn declared_files(mut self, files: u32) -> Self {
        self.declared_files = Some(files);
        self
    }

    /// Serializes the archive.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        // Both tables have fixed-width cells, so their length does not
        // depend on the offsets written into them.
        let header_len = self.header_table(0, 0).len() as u64;
        let toc_len = 0x10 + self.toc_table(&vec![0; self.files.len()]).len() as u64;
        let content_len: u64 = self
            .files
            .iter()
            .map(|f| align_up(f.stored.len() as u64, ALIGN))
            .sum();

        let after_header = align_up(0x10 + header_len, ALIGN);
        let (toc_offset, content_offset) = match self.layout {
            CpkLayout::TocFirst => (after_header, align_up(after_header + toc_len, ALIGN)),
            CpkLayout::ContentFirst => (align_up(after_header + content_len, ALIGN), after_header),
        };
        let base = content_offset.min(toc_offset);

        let mut file_offsets = Vec::with_capacity(self.files.len());
        let mut cursor = content_offset;
        for file in &self.files {
            file_offsets.push(cursor - base);
            cursor += align_up(file.stored.len() as u64, ALIGN);
        }

        let end = (toc_offset + toc_len).max(content_offset + content_len);
        let mut image = vec![0u8; end as usize];
        image[..4].copy_from_slice(b"CPK ");
        place(&mut image, 0x10, &self.header_table(toc_offset, content_offset));
        place(&mut image, toc_offset, b"TOC ");
        place(&mut image, toc_offset + 0x10, &self.toc_table(&file_offsets));
        for (file, relative) in self.files.iter().zip(&file_offsets) {
            place(&mut image, base + relative, &file.stored);
        }
        image
    }

    fn header_table(&self, toc_offset: u64, content_offset: u64) -> Vec<u8> {
        let files = self.declared_files.unwrap_or(self.files.len() as u32);
        UtfTableBuilder::new("CpkHeader")
            .column("UpdateDateTime", kind::U64)
            .column("ContentOffset", kind::U64)
            .column("TocOffset", kind::U64)
            .constant("Align", FixtureValue::U16(ALIGN as u16))
            .column("Files", kind::U32)
            .zero("EtocOffset", kind::U64)
            .row(vec![
                FixtureValue::U64(1),
                FixtureValue::U64(content_offset),
                FixtureValue::U64(toc_offset),
                FixtureValue::U32(files),
            ])
            .build()
    }

    fn toc_table(&self, file_offsets: &[u64]) -> Vec<u8> {
        let mut table = UtfTableBuilder::new("CpkTocInfo")
            .column("DirName", kind::STRING)
            .column("FileName", kind::STRING)
            .column("FileSize", kind::U32)
            .column("ExtractSize", kind::U32)
            .column("FileOffset", kind::U64)
            .column("ID", kind::U32)
            .constant("UserString", FixtureValue::str("<NULL>"));

        for (id, (file, offset)) in self.files.iter().zip(file_offsets).enumerate() {
            table = table.row(vec![
                FixtureValue::str(file.dir.clone()),
                FixtureValue::str(file.name.clone()),
                FixtureValue::U32(file.stored.len() as u32),
                FixtureValue::U32(file.extract_size),
                FixtureValue::U64(*offset),
                FixtureValue::U32(id as u32),
            ]);
        }
        table.build()
    }
}

fn align_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

fn place(image: &mut [u8], at: u64, bytes: &[u8]) {
    let at = at as usize;
    image[at..at + bytes.len()].copy_from_slice(bytes);
}

/// A file written into a temporary directory that lives as long as this value.
pub struct TempArchive {
    dir: TempDir,
    path: PathBuf,
}

impl TempArchive {
    /// Writes `bytes` to `<tempdir>/<name>`.
    pub fn new(name: &str, bytes: &[u8]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join(name);
        fs::write(&path, bytes).expect("Failed to write archive");
        Self { dir, path }
    }

    /// Path of the written file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The temporary directory holding the file.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
