//! Archive header and TOC.
//!
//! A CPK image starts with `CPK ` and a `CpkHeader` table at 0x10. The
//! header names the TOC, which is a `TOC ` signature followed 0x10 bytes
//! later by a table with one row per file.

use crate::entry::CpkTocEntry;
use crate::error::{CoreError, CoreResult};
use cpk_storage::{ReadAtExt, StorageBackend};
use cpk_utf::{analyze, UtfTable};
use serde::Serialize;
use tracing::debug;

/// Signature at offset 0.
pub const CPK_SIGNATURE: [u8; 4] = *b"CPK ";

/// Signature at the TOC offset.
pub const TOC_SIGNATURE: [u8; 4] = *b"TOC ";

/// Distance from a section signature to its table.
pub const SECTION_TABLE_OFFSET: u64 = 0x10;

/// Largest absolute file offset an entry may resolve to.
pub const MAX_FILE_OFFSET: u64 = i64::MAX as u64;

/// Values read from the `CpkHeader` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpkHeader {
    /// `TocOffset` column.
    pub toc_offset: u64,
    /// `ContentOffset` column.
    pub content_offset: u64,
    /// `Files` column.
    pub files: u32,
}

impl CpkHeader {
    /// The offset entry `FileOffset` values are relative to: whichever of
    /// the content and TOC regions comes first.
    #[must_use]
    pub const fn base_offset(&self) -> u64 {
        if self.content_offset < self.toc_offset {
            self.content_offset
        } else {
            self.toc_offset
        }
    }
}

/// An opened CPK archive.
///
/// Holds the parsed header and TOC tables; entry rows are decoded from the
/// source on demand.
#[derive(Debug)]
pub struct CpkArchive {
    header: CpkHeader,
    header_table: UtfTable,
    toc: UtfTable,
}

impl CpkArchive {
    /// Reads the header and TOC tables.
    ///
    /// # Errors
    ///
    /// - [`CoreError::BadSignature`] when `CPK ` or `TOC ` is missing
    /// - [`CoreError::RowCountMismatch`] when the header table does not have
    ///   exactly one row or the TOC row count differs from `Files`
    /// - any table error from the header or TOC
    pub fn open<S: StorageBackend + ?Sized>(source: &S) -> CoreResult<Self> {
        expect_signature(source, 0, CPK_SIGNATURE, "CPK ")?;

        let header_table = analyze(source, SECTION_TABLE_OFFSET)?;
        if header_table.rows() != 1 {
            return Err(CoreError::RowCountMismatch {
                table: header_table.name().to_owned(),
                offset: header_table.offset(),
                expected: 1,
                actual: header_table.rows(),
            });
        }

        let header = CpkHeader {
            toc_offset: header_table.get_u64(source, 0, "TocOffset")?,
            content_offset: header_table.get_u64(source, 0, "ContentOffset")?,
            files: header_table.get_u32(source, 0, "Files")?,
        };
        debug!(
            toc_offset = header.toc_offset,
            content_offset = header.content_offset,
            files = header.files,
            "read CpkHeader"
        );

        expect_signature(source, header.toc_offset, TOC_SIGNATURE, "TOC ")?;
        let toc = analyze(source, section_table_offset(header.toc_offset)?)?;
        if toc.rows() != header.files {
            return Err(CoreError::RowCountMismatch {
                table: toc.name().to_owned(),
                offset: toc.offset(),
                expected: u64::from(header.files),
                actual: toc.rows(),
            });
        }

        Ok(Self {
            header,
            header_table,
            toc,
        })
    }

    /// Values read from the header table.
    #[must_use]
    pub const fn header(&self) -> &CpkHeader {
        &self.header
    }

    /// The parsed `CpkHeader` table.
    #[must_use]
    pub const fn header_table(&self) -> &UtfTable {
        &self.header_table
    }

    /// The parsed TOC table.
    #[must_use]
    pub const fn toc(&self) -> &UtfTable {
        &self.toc
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.toc.rows()
    }

    /// Whether the archive lists no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads TOC row `index`.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::ValueTooLarge`] when the base-adjusted file
    /// offset exceeds [`MAX_FILE_OFFSET`], and with a table error for a
    /// missing or mistyped column.
    pub fn entry<S: StorageBackend + ?Sized>(&self, source: &S, index: u32) -> CoreResult<CpkTocEntry> {
        let toc = &self.toc;
        let raw_offset = toc.get_u64(source, index, "FileOffset")?;
        let file_offset = raw_offset
            .checked_add(self.header.base_offset())
            .filter(|offset| *offset <= MAX_FILE_OFFSET)
            .ok_or_else(|| {
                CoreError::value_too_large(
                    "file offset",
                    raw_offset.saturating_add(self.header.base_offset()),
                    MAX_FILE_OFFSET,
                )
            })?;

        let entry = CpkTocEntry {
            index,
            dir_name: toc.get_string(source, index, "DirName")?,
            file_name: toc.get_string(source, index, "FileName")?,
            file_size: toc.get_u32(source, index, "FileSize")?,
            extract_size: toc.get_u32(source, index, "ExtractSize")?,
            file_offset,
        };
        debug!(
            index,
            path = %entry.archive_path(),
            offset = entry.file_offset,
            size = entry.file_size,
            "read TOC entry"
        );
        Ok(entry)
    }

    /// Reads every TOC row.
    pub fn entries<S: StorageBackend + ?Sized>(&self, source: &S) -> CoreResult<Vec<CpkTocEntry>> {
        (0..self.len()).map(|index| self.entry(source, index)).collect()
    }
}

fn expect_signature<S: StorageBackend + ?Sized>(
    source: &S,
    offset: u64,
    signature: [u8; 4],
    expected: &'static str,
) -> CoreResult<()> {
    let found: [u8; 4] = source.read_array_at(offset)?;
    if found != signature {
        return Err(CoreError::BadSignature {
            expected,
            offset,
            found,
        });
    }
    Ok(())
}

/// Offset of the `@UTF` table that follows a section signature.
fn section_table_offset(section: u64) -> CoreResult<u64> {
    section.checked_add(SECTION_TABLE_OFFSET).ok_or_else(|| {
        CoreError::value_too_large("TOC table offset", section, u64::MAX - SECTION_TABLE_OFFSET)
    })
}
