//! Single-cell queries and typed accessors.
//!
//! Accessors mirror the unsigned column kinds CPK metadata uses: each one
//! accepts exactly the kind it names and reports any other stored kind as
//! [`UtfError::TypeMismatch`].

use crate::column::ColumnKind;
use crate::error::{UtfError, UtfResult};
use crate::table::{analyze, probe, UtfTable};
use crate::value::{DataRef, TypedValue};
use cpk_storage::StorageBackend;
use serde::Serialize;

/// Outcome of a query that tolerates missing tables and cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Lookup {
    /// No `@UTF` table at the offset.
    InvalidTable,
    /// The table exists but has no such row or column.
    NotFound,
    /// The cell's value.
    Found(TypedValue),
}

impl Lookup {
    /// The value, if one was found.
    #[must_use]
    pub fn found(self) -> Option<TypedValue> {
        match self {
            Self::Found(value) => Some(value),
            Self::InvalidTable | Self::NotFound => None,
        }
    }
}

impl UtfTable {
    /// Looks up column `name` in row `row`.
    ///
    /// Only the requested row is decoded, and it is decoded even when no
    /// column has that name, so a corrupt row width is always reported.
    /// Returns `Ok(None)` when the row is out of range or the column is
    /// missing.
    pub fn lookup<S: StorageBackend + ?Sized>(
        &self,
        source: &S,
        row: u32,
        name: &str,
    ) -> UtfResult<Option<TypedValue>> {
        if row >= self.rows() {
            return Ok(None);
        }
        let decoded = self.row(source, row)?;
        Ok(self.column_index(name).and_then(|column| decoded.take(column)))
    }

    /// Like [`lookup`](Self::lookup), failing with
    /// [`UtfError::ColumnNotFound`] instead of returning `None`.
    pub fn get<S: StorageBackend + ?Sized>(
        &self,
        source: &S,
        row: u32,
        name: &str,
    ) -> UtfResult<TypedValue> {
        self.lookup(source, row, name)?
            .ok_or_else(|| UtfError::ColumnNotFound {
                offset: self.offset(),
                row,
                name: name.to_owned(),
            })
    }

    /// Reads a kind-6 (`u64`) cell.
    pub fn get_u64<S: StorageBackend + ?Sized>(&self, source: &S, row: u32, name: &str) -> UtfResult<u64> {
        match self.get(source, row, name)? {
            TypedValue::U64(v) => Ok(v),
            other => Err(self.mismatch(name, ColumnKind::U64, &other)),
        }
    }

    /// Reads a kind-4 (`u32`) cell.
    pub fn get_u32<S: StorageBackend + ?Sized>(&self, source: &S, row: u32, name: &str) -> UtfResult<u32> {
        match self.get(source, row, name)? {
            TypedValue::U32(v) => Ok(v),
            other => Err(self.mismatch(name, ColumnKind::U32, &other)),
        }
    }

    /// Reads a kind-2 (`u16`) cell.
    pub fn get_u16<S: StorageBackend + ?Sized>(&self, source: &S, row: u32, name: &str) -> UtfResult<u16> {
        match self.get(source, row, name)? {
            TypedValue::U16(v) => Ok(v),
            other => Err(self.mismatch(name, ColumnKind::U16, &other)),
        }
    }

    /// Reads a string cell.
    pub fn get_string<S: StorageBackend + ?Sized>(
        &self,
        source: &S,
        row: u32,
        name: &str,
    ) -> UtfResult<String> {
        match self.get(source, row, name)? {
            TypedValue::Str(s) => Ok(s.value),
            other => Err(self.mismatch(name, ColumnKind::String, &other)),
        }
    }

    /// Reads a data cell.
    pub fn get_data<S: StorageBackend + ?Sized>(
        &self,
        source: &S,
        row: u32,
        name: &str,
    ) -> UtfResult<DataRef> {
        match self.get(source, row, name)? {
            TypedValue::Data(d) => Ok(d),
            other => Err(self.mismatch(name, ColumnKind::Data, &other)),
        }
    }

    fn mismatch(&self, name: &str, expected: ColumnKind, found: &TypedValue) -> UtfError {
        UtfError::TypeMismatch {
            offset: self.offset(),
            name: name.to_owned(),
            expected,
            found: found.kind(),
        }
    }
}

/// Queries one cell of the table at `offset`.
///
/// A missing signature is reported as [`Lookup::InvalidTable`] and a row or
/// column that does not exist as [`Lookup::NotFound`]; neither is an error.
pub fn query<S: StorageBackend + ?Sized>(
    source: &S,
    offset: u64,
    row: u32,
    name: &str,
) -> UtfResult<Lookup> {
    let Some(table) = probe(source, offset)? else {
        return Ok(Lookup::InvalidTable);
    };
    Ok(match table.lookup(source, row, name)? {
        Some(value) => Lookup::Found(value),
        None => Lookup::NotFound,
    })
}

/// Queries one cell, failing with [`UtfError::BadSignature`] or
/// [`UtfError::ColumnNotFound`] where [`query`] would not.
pub fn query_nofail<S: StorageBackend + ?Sized>(
    source: &S,
    offset: u64,
    row: u32,
    name: &str,
) -> UtfResult<TypedValue> {
    analyze(source, offset)?.get(source, row, name)
}

/// Reads a `u64` cell of the table at `offset`.
pub fn query_u64<S: StorageBackend + ?Sized>(source: &S, offset: u64, row: u32, name: &str) -> UtfResult<u64> {
    analyze(source, offset)?.get_u64(source, row, name)
}

/// Reads a `u32` cell of the table at `offset`.
pub fn query_u32<S: StorageBackend + ?Sized>(source: &S, offset: u64, row: u32, name: &str) -> UtfResult<u32> {
    analyze(source, offset)?.get_u32(source, row, name)
}

/// Reads a `u16` cell of the table at `offset`.
pub fn query_u16<S: StorageBackend + ?Sized>(source: &S, offset: u64, row: u32, name: &str) -> UtfResult<u16> {
    analyze(source, offset)?.get_u16(source, row, name)
}

/// Reads a string cell of the table at `offset`.
pub fn query_string<S: StorageBackend + ?Sized>(
    source: &S,
    offset: u64,
    row: u32,
    name: &str,
) -> UtfResult<String> {
    analyze(source, offset)?.get_string(source, row, name)
}

/// Reads a data cell of the table at `offset`.
pub fn query_data<S: StorageBackend + ?Sized>(
    source: &S,
    offset: u64,
    row: u32,
    name: &str,
) -> UtfResult<DataRef> {
    analyze(source, offset)?.get_data(source, row, name)
}
