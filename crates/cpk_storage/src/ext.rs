//! Fixed-width reads at absolute offsets.

use crate::backend::StorageBackend;
use crate::error::StorageResult;

/// Convenience readers layered over [`StorageBackend::read_at`].
///
/// CPK metadata mixes byte orders: @UTF tables are big-endian while the
/// CRILAYLA header is little-endian. Each helper names its byte order so
/// call sites cannot confuse the two.
pub trait ReadAtExt: StorageBackend {
    /// Reads exactly `N` bytes at `offset`.
    fn read_array_at<const N: usize>(&self, offset: u64) -> StorageResult<[u8; N]> {
        let bytes = self.read_at(offset, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&bytes);
        Ok(out)
    }

    /// Reads one byte at `offset`.
    fn read_u8_at(&self, offset: u64) -> StorageResult<u8> {
        let [byte] = self.read_array_at::<1>(offset)?;
        Ok(byte)
    }

    /// Reads a big-endian `u16` at `offset`.
    fn read_u16_be_at(&self, offset: u64) -> StorageResult<u16> {
        self.read_array_at(offset).map(u16::from_be_bytes)
    }

    /// Reads a big-endian `u32` at `offset`.
    fn read_u32_be_at(&self, offset: u64) -> StorageResult<u32> {
        self.read_array_at(offset).map(u32::from_be_bytes)
    }

    /// Reads a big-endian `u64` at `offset`.
    fn read_u64_be_at(&self, offset: u64) -> StorageResult<u64> {
        self.read_array_at(offset).map(u64::from_be_bytes)
    }

    /// Reads a little-endian `u32` at `offset`.
    fn read_u32_le_at(&self, offset: u64) -> StorageResult<u32> {
        self.read_array_at(offset).map(u32::from_le_bytes)
    }
}

impl<T: StorageBackend + ?Sized> ReadAtExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryBackend, StorageError};

    fn backend() -> InMemoryBackend {
        InMemoryBackend::with_data(vec![0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0])
    }

    #[test]
    fn big_endian_reads() {
        let backend = backend();
        assert_eq!(backend.read_u8_at(1).unwrap(), 0x34);
        assert_eq!(backend.read_u16_be_at(0).unwrap(), 0x1234);
        assert_eq!(backend.read_u32_be_at(4).unwrap(), 0x9abc_def0);
        assert_eq!(backend.read_u64_be_at(0).unwrap(), 0x1234_5678_9abc_def0);
    }

    #[test]
    fn little_endian_read() {
        let backend = backend();
        assert_eq!(backend.read_u32_le_at(0).unwrap(), 0x7856_3412);
    }

    #[test]
    fn works_through_trait_object() {
        let backend = backend();
        let source: &dyn StorageBackend = &backend;
        assert_eq!(source.read_u16_be_at(6).unwrap(), 0xdef0);
    }

    #[test]
    fn short_read_fails() {
        let backend = backend();
        assert!(matches!(
            backend.read_u32_be_at(6),
            Err(StorageError::ReadPastEnd { offset: 6, len: 4, .. })
        ));
    }
}
