//! # CPK Core
//!
//! Walks CRI Middleware CPK archives and extracts their files.
//!
//! [`CpkArchive::open`] checks the `CPK ` signature, reads the `CpkHeader`
//! table at 0x10 and the TOC table it points at, and exposes each TOC row
//! as a [`CpkTocEntry`]. [`Unpacker`] writes every entry under an output
//! directory, decoding CRILAYLA entries (those whose `ExtractSize` exceeds
//! their `FileSize`) on the way.
//!
//! ## Example
//!
//! ```rust
//! use cpk_core::CpkArchive;
//! use cpk_storage::InMemoryBackend;
//! use cpk_testkit::CpkImageBuilder;
//!
//! let image = CpkImageBuilder::new()
//!     .file("data", "a.bin", b"abc".to_vec())
//!     .build();
//! let source = InMemoryBackend::with_data(image);
//!
//! let archive = CpkArchive::open(&source).unwrap();
//! let entry = archive.entry(&source, 0).unwrap();
//! assert_eq!(entry.archive_path(), "data/a.bin");
//! assert!(!entry.is_compressed());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod archive;
mod config;
mod crilayla_io;
mod entry;
mod error;
mod unpack;

pub use archive::{
    CpkArchive, CpkHeader, CPK_SIGNATURE, MAX_FILE_OFFSET, SECTION_TABLE_OFFSET, TOC_SIGNATURE,
};
pub use config::{default_output_dir, ErrorPolicy, UnpackConfig, OUTPUT_SUFFIX};
pub use crilayla_io::{copy_range, crilayla_decode, crilayla_encode, COPY_CHUNK};
pub use entry::CpkTocEntry;
pub use error::{CoreError, CoreResult};
pub use unpack::{ExtractedFile, FailedEntry, UnpackReport, Unpacker};
