//! # CPK Storage
//!
//! Storage backend trait and implementations for the CPK toolkit.
//!
//! Backends are **opaque byte stores** - they do not interpret the data
//! they hold. The archive, table and codec layers only ever ask for
//! positioned reads (`read_at`) on a source and sequential writes
//! (`append`) on a sink.
//!
//! ## Design Principles
//!
//! - Reads are positioned: a read never moves a cursor another caller can see
//! - No knowledge of CPK, @UTF or CRILAYLA formats
//! - Must be `Send + Sync` so one source can back several readers
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and in-memory images
//! - [`FileBackend`] - For archives and extracted files on disk
//!
//! ## Example
//!
//! ```rust
//! use cpk_storage::{InMemoryBackend, ReadAtExt, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(&[0x00, 0x00, 0x01, 0x00]).unwrap();
//! assert_eq!(backend.read_u32_be_at(offset).unwrap(), 256);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod ext;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use ext::ReadAtExt;
pub use file::FileBackend;
pub use memory::InMemoryBackend;
