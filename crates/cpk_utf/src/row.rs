//! Row decoding.

use crate::column::StorageClass;
use crate::error::{offset_add, UtfError, UtfResult};
use crate::table::UtfTable;
use crate::value::TypedValue;
use cpk_storage::StorageBackend;
use serde::Serialize;
use tracing::trace;

/// One decoded cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    /// Index into the table schema.
    pub column: usize,
    /// Row cursor when the cell was decoded, relative to the row start.
    pub row_offset: u64,
    /// The decoded value.
    pub value: TypedValue,
}

/// One decoded row, with a cell for every column in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Row index.
    pub index: u32,
    /// Absolute offset of the row.
    pub offset: u64,
    /// Cells in schema order.
    pub cells: Vec<Cell>,
}

impl Row {
    /// The value of column `column`.
    #[must_use]
    pub fn value(&self, column: usize) -> Option<&TypedValue> {
        self.cells.get(column).map(|c| &c.value)
    }

    /// Takes the value of column `column`.
    #[must_use]
    pub fn take(mut self, column: usize) -> Option<TypedValue> {
        (column < self.cells.len()).then(|| self.cells.swap_remove(column).value)
    }
}

impl UtfTable {
    /// Decodes row `index`.
    ///
    /// Per-row columns consume bytes from the row in schema order; constant
    /// and zero columns consume none.
    ///
    /// # Errors
    ///
    /// Fails with [`UtfError::RowOutOfRange`] for an index past the last
    /// row and with [`UtfError::SchemaRowWidthMismatch`] when the per-row
    /// columns do not add up to the declared row width.
    pub fn row<S: StorageBackend + ?Sized>(&self, source: &S, index: u32) -> UtfResult<Row> {
        if index >= self.rows() {
            return Err(UtfError::RowOutOfRange {
                row: index,
                rows: self.rows(),
            });
        }

        let consumed = self.schema_row_width();
        if consumed != u64::from(self.row_width()) {
            return Err(UtfError::SchemaRowWidthMismatch {
                offset: self.offset(),
                row: index,
                expected: self.row_width(),
                actual: consumed,
            });
        }

        let offset = offset_add(
            self.rows_start()?,
            u64::from(index) * u64::from(self.row_width()),
            "row",
        )?;
        let raw = source.read_at(offset, usize::from(self.row_width()))?;

        let mut cursor = 0usize;
        let mut cells = Vec::with_capacity(self.columns());
        for (column, spec) in self.schema().iter().enumerate() {
            let row_offset = cursor as u64;
            let value = match spec.storage {
                StorageClass::Zero => TypedValue::zero(spec.kind, self.strings())?,
                StorageClass::Constant => match &spec.constant {
                    Some(value) => value.clone(),
                    None => TypedValue::zero(spec.kind, self.strings())?,
                },
                StorageClass::PerRow => {
                    let width = usize::from(spec.kind.width());
                    let value =
                        TypedValue::decode(spec.kind, &raw[cursor..cursor + width], self.strings())?;
                    cursor += width;
                    value
                }
            };
            cells.push(Cell {
                column,
                row_offset,
                value,
            });
        }

        trace!(table = %self.name(), row = index, offset, "decoded row");
        Ok(Row {
            index,
            offset,
            cells,
        })
    }

    /// Decodes every row in order.
    pub fn rows_iter<'a, S: StorageBackend + ?Sized>(
        &'a self,
        source: &'a S,
    ) -> impl Iterator<Item = UtfResult<Row>> + 'a {
        (0..self.rows()).map(move |index| self.row(source, index))
    }
}
