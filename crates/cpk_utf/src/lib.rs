//! # CPK UTF
//!
//! Reader for the `@UTF` tables that hold every piece of CPK metadata.
//!
//! A table is a 32-byte header, a schema of typed columns, fixed-width
//! rows, a NUL-terminated string table and a data region. All integers are
//! big-endian and all offsets in the header are relative to the table
//! start plus eight.
//!
//! ## Columns
//!
//! Each column has a storage class (per-row, constant, or zero) and one of
//! twelve value kinds. Only per-row columns consume row bytes. Data cells
//! name a byte range in the data region which may itself be a nested table;
//! [`UtfTable::nested`] and [`walk`] descend into those on demand.
//!
//! ## Example
//!
//! ```rust
//! use cpk_storage::InMemoryBackend;
//! use cpk_testkit::{kind, FixtureValue, UtfTableBuilder};
//! use cpk_utf::{analyze, query, Lookup, TypedValue};
//!
//! let bytes = UtfTableBuilder::new("Header")
//!     .column("Files", kind::U32)
//!     .row(vec![FixtureValue::U32(3)])
//!     .build();
//! let source = InMemoryBackend::with_data(bytes);
//!
//! let table = analyze(&source, 0).unwrap();
//! assert_eq!(table.name(), "Header");
//! assert_eq!(table.get_u32(&source, 0, "Files").unwrap(), 3);
//! assert_eq!(query(&source, 0, 0, "Files").unwrap(), Lookup::Found(TypedValue::U32(3)));
//! assert_eq!(query(&source, 0, 1, "Files").unwrap(), Lookup::NotFound);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod column;
mod dump;
mod error;
mod query;
mod row;
mod string_table;
mod table;
mod value;

pub use column::{ColumnKind, ColumnSpec, StorageClass, KIND_MASK, STORAGE_MASK};
pub use dump::{
    dump_text, dump_tree, walk, CellNode, RowNode, TableNode, TableVisitor, TextDump,
    TreeBuilder, TreeNode, INDENT_STEP, MAX_DEPTH,
};
pub use error::{UtfError, UtfResult};
pub use query::{
    query, query_data, query_nofail, query_string, query_u16, query_u32, query_u64, Lookup,
};
pub use row::{Cell, Row};
pub use string_table::StringTable;
pub use table::{analyze, load_string_table, probe, TableHeader, UtfTable, SCHEMA_OFFSET, SIGNATURE};
pub use value::{DataRef, StringRef, TypedValue};
