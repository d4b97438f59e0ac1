//! Shared inputs for the CPK benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
