//! Walking tables and their nested tables.
//!
//! [`walk`] visits a table row by row and descends into every non-empty
//! data cell, probing it as a nested table. Rendering is left to a
//! [`TableVisitor`]: [`TextDump`] produces the indented diagnostic layout
//! and [`TreeBuilder`] collects a serializable [`TreeNode`].

use crate::column::{ColumnSpec, StorageClass};
use crate::error::{UtfError, UtfResult};
use crate::row::{Cell, Row};
use crate::table::{probe, UtfTable};
use crate::value::TypedValue;
use cpk_storage::StorageBackend;
use serde::Serialize;
use std::fmt::Write as _;

/// Nesting depth past which [`walk`] gives up.
pub const MAX_DEPTH: usize = 64;

/// Spaces added per nesting level by [`TextDump`].
pub const INDENT_STEP: usize = 2;

/// Callbacks invoked by [`walk`].
///
/// Every method defaults to doing nothing. A nested table is walked right
/// after the [`cell`](Self::cell) call for the data cell that refers to it.
pub trait TableVisitor {
    /// A table was found and parsed.
    fn begin_table(&mut self, _table: &UtfTable) {}

    /// A row is about to be visited.
    fn begin_row(&mut self, _table: &UtfTable, _row: &Row) {}

    /// One cell of the current row.
    fn cell(&mut self, _table: &UtfTable, _cell: &Cell) {}

    /// All cells of the row were visited.
    fn end_row(&mut self, _table: &UtfTable, _row: &Row) {}

    /// All rows of the table were visited.
    fn end_table(&mut self, _table: &UtfTable) {}

    /// The bytes at `offset` do not start with a `@UTF` signature.
    fn not_a_table(&mut self, _offset: u64) {}
}

/// Walks the table at `offset` and everything nested in it.
///
/// # Errors
///
/// Propagates parse and decode errors, and fails with
/// [`UtfError::InvalidLayout`] when tables nest deeper than [`MAX_DEPTH`].
pub fn walk<S, V>(source: &S, offset: u64, visitor: &mut V) -> UtfResult<()>
where
    S: StorageBackend + ?Sized,
    V: TableVisitor + ?Sized,
{
    walk_at(source, offset, visitor, 0)
}

fn walk_at<S, V>(source: &S, offset: u64, visitor: &mut V, depth: usize) -> UtfResult<()>
where
    S: StorageBackend + ?Sized,
    V: TableVisitor + ?Sized,
{
    if depth > MAX_DEPTH {
        return Err(UtfError::invalid_layout(
            offset,
            format!("tables nested deeper than {MAX_DEPTH} levels"),
        ));
    }

    let Some(table) = probe(source, offset)? else {
        visitor.not_a_table(offset);
        return Ok(());
    };

    visitor.begin_table(&table);
    for row in table.rows_iter(source) {
        let row = row?;
        visitor.begin_row(&table, &row);
        for cell in &row.cells {
            visitor.cell(&table, cell);
            if let TypedValue::Data(data) = &cell.value {
                if !data.is_empty() {
                    walk_at(source, table.data_offset(data)?, visitor, depth + 1)?;
                }
            }
        }
        visitor.end_row(&table, &row);
    }
    visitor.end_table(&table);
    Ok(())
}

/// Renders tables as indented text.
///
/// ```text
/// {
///   CpkHeader[0] = {
///     00000000 56 TocOffset = 0x800
///     00000008 32 Align = constant 2048
///     00000008 16 EtocOffset = UNDEFINED
///   }
/// }
/// ```
#[derive(Debug, Default)]
pub struct TextDump {
    out: String,
    indent: usize,
}

impl TextDump {
    /// Creates an empty dump.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The text rendered so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Consumes the dump, returning the text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.out
    }

    fn line(&mut self, text: impl std::fmt::Display) {
        let _ = writeln!(self.out, "{:indent$}{text}", "", indent = self.indent);
    }
}

impl TableVisitor for TextDump {
    fn begin_table(&mut self, _table: &UtfTable) {
        self.line("{");
        self.indent += INDENT_STEP;
    }

    fn begin_row(&mut self, table: &UtfTable, row: &Row) {
        self.line(format_args!("{}[{}] = {{", table.name(), row.index));
        self.indent += INDENT_STEP;
    }

    fn cell(&mut self, table: &UtfTable, cell: &Cell) {
        let Some(spec) = table.schema().get(cell.column) else {
            return;
        };
        let value = match spec.storage {
            StorageClass::Zero => "UNDEFINED".to_owned(),
            StorageClass::Constant => format!("constant {}", cell.value),
            StorageClass::PerRow => cell.value.to_string(),
        };
        self.line(format_args!(
            "{:08x} {:02x} {} = {value}",
            cell.row_offset, spec.type_code, spec.name
        ));
    }

    fn end_row(&mut self, _table: &UtfTable, _row: &Row) {
        self.indent = self.indent.saturating_sub(INDENT_STEP);
        self.line("}");
    }

    fn end_table(&mut self, _table: &UtfTable) {
        self.indent = self.indent.saturating_sub(INDENT_STEP);
        self.line("}");
    }

    fn not_a_table(&mut self, offset: u64) {
        self.line("{");
        self.indent += INDENT_STEP;
        self.line(format_args!("not a @UTF table at {offset:08X}"));
        self.indent = self.indent.saturating_sub(INDENT_STEP);
        self.line("}");
    }
}

/// A walked table or a region that turned out not to be one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// A parsed table.
    Table(TableNode),
    /// No `@UTF` signature at `offset`.
    NotATable {
        /// Absolute offset that was probed.
        offset: u64,
    },
}

/// One table in a [`TreeNode`] tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableNode {
    /// Absolute offset of the table.
    pub offset: u64,
    /// Table name.
    pub name: String,
    /// Schema entries.
    pub columns: Vec<ColumnSpec>,
    /// Decoded rows.
    pub rows: Vec<RowNode>,
}

/// One row in a [`TableNode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowNode {
    /// Row index.
    pub index: u32,
    /// Cells in schema order.
    pub cells: Vec<CellNode>,
}

/// One cell in a [`RowNode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellNode {
    /// Column name.
    pub name: String,
    /// Decoded value.
    pub value: TypedValue,
    /// What the cell's data region holds, for non-empty data cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<Box<TreeNode>>,
}

/// Collects a [`TreeNode`] while walking.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<TableNode>,
    root: Option<TreeNode>,
}

impl TreeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished tree, once the walk completed.
    #[must_use]
    pub fn finish(self) -> Option<TreeNode> {
        self.root
    }

    fn attach(&mut self, node: TreeNode) {
        let slot = self
            .stack
            .last_mut()
            .and_then(|table| table.rows.last_mut())
            .and_then(|row| row.cells.last_mut());
        match slot {
            Some(cell) => cell.nested = Some(Box::new(node)),
            None => self.root = Some(node),
        }
    }
}

impl TableVisitor for TreeBuilder {
    fn begin_table(&mut self, table: &UtfTable) {
        self.stack.push(TableNode {
            offset: table.offset(),
            name: table.name().to_owned(),
            columns: table.schema().to_vec(),
            rows: Vec::with_capacity(table.rows() as usize),
        });
    }

    fn begin_row(&mut self, _table: &UtfTable, row: &Row) {
        if let Some(node) = self.stack.last_mut() {
            node.rows.push(RowNode {
                index: row.index,
                cells: Vec::with_capacity(row.cells.len()),
            });
        }
    }

    fn cell(&mut self, table: &UtfTable, cell: &Cell) {
        let name = table
            .schema()
            .get(cell.column)
            .map(|spec| spec.name.clone())
            .unwrap_or_default();
        if let Some(row) = self.stack.last_mut().and_then(|node| node.rows.last_mut()) {
            row.cells.push(CellNode {
                name,
                value: cell.value.clone(),
                nested: None,
            });
        }
    }

    fn end_table(&mut self, _table: &UtfTable) {
        if let Some(node) = self.stack.pop() {
            self.attach(TreeNode::Table(node));
        }
    }

    fn not_a_table(&mut self, offset: u64) {
        self.attach(TreeNode::NotATable { offset });
    }
}

/// Renders the table at `offset` with [`TextDump`].
pub fn dump_text<S: StorageBackend + ?Sized>(source: &S, offset: u64) -> UtfResult<String> {
    let mut dump = TextDump::new();
    walk(source, offset, &mut dump)?;
    Ok(dump.into_string())
}

/// Collects the table at `offset` into a [`TreeNode`].
pub fn dump_tree<S: StorageBackend + ?Sized>(source: &S, offset: u64) -> UtfResult<TreeNode> {
    let mut builder = TreeBuilder::new();
    walk(source, offset, &mut builder)?;
    Ok(builder
        .finish()
        .unwrap_or(TreeNode::NotATable { offset }))
}
