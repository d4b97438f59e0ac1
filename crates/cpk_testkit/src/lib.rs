//! # CPK Testkit
//!
//! Test utilities for the CPK toolkit.
//!
//! This crate provides:
//! - Byte-level builders for @UTF tables and CPK images
//! - Property-based test generators using proptest
//! - Known-answer CRILAYLA vectors
//!
//! It deliberately depends on none of the crates it helps test, so every
//! fixture is an independent description of the on-disk format.
//!
//! ## Usage
//!
//! ```rust
//! use cpk_testkit::prelude::*;
//!
//! let image = CpkImageBuilder::new()
//!     .file("data", "hello.txt", b"hello".to_vec())
//!     .build();
//! assert_eq!(&image[..4], b"CPK ");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use vectors::*;
