//! # CPK CRILAYLA
//!
//! The CRILAYLA compression format used for entries of CRI Middleware CPK
//! archives.
//!
//! A CRILAYLA container stores its payload in two parts: the first 256
//! bytes verbatim, and the remainder as an LZ77-style bitstream that is
//! produced from the last payload byte toward the first and read from the
//! end of the compressed region toward its start.
//!
//! ## Bitstream
//!
//! - Bits are consumed most-significant first from bytes taken back to front
//! - `0` flag: the next 8 bits are a literal byte
//! - `1` flag: a 13-bit window offset, then a variable-length copy length
//! - Copy sources sit `offset + 3` bytes above the write position and may
//!   overlap the bytes being written
//!
//! ## Usage
//!
//! ```
//! use cpk_crilayla::{compress_to_vec, decompress};
//!
//! let payload: Vec<u8> = (0..1024u32).map(|i| (i % 7) as u8).collect();
//! let container = compress_to_vec(&payload).unwrap();
//! assert!(container.len() < payload.len());
//! assert_eq!(decompress(&container).unwrap(), payload);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backref;
mod bitstream;
mod block;
mod decoder;
mod encoder;
mod error;
mod matcher;

pub use backref::{
    length_bits, read_length, write_length, BackreferenceOp, MIN_MATCH, OFFSET_BIAS,
    OFFSET_BITS, WINDOW_SIZE,
};
pub use bitstream::{BitReader, BitWriter};
pub use block::{CompressedBlock, ContainerHeader, Magic, HEADER_LEN, MAGIC, RAW_BLOCK_LEN};
pub use decoder::{decompress, CrilaylaDecoder};
pub use encoder::{compress, compress_to_vec, CrilaylaEncoder, EncodeStats};
pub use error::{CodecError, CodecResult};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn uniform_run_roundtrips() {
        let payload = vec![0xA5u8; 256 + 4096];
        let block = compress(&payload).unwrap();
        assert_eq!(block.compressed_size() % 4, 0);
        assert!(block.compressed_data.len() < 64);
        assert_eq!(decompress(&block.to_bytes()).unwrap(), payload);
    }

    #[test]
    fn parsed_block_decodes_identically() {
        let payload: Vec<u8> = (0..3000u32).map(|i| (i * 31 % 251) as u8).collect();
        let bytes = compress_to_vec(&payload).unwrap();
        let block = CompressedBlock::parse(&bytes).unwrap();
        assert_eq!(block.to_bytes(), bytes);
        assert_eq!(block.header().payload_len(), payload.len() as u64);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn compress_then_decompress(
            payload in prop::collection::vec(0u8..8, 257..4000),
        ) {
            let block = compress(&payload).unwrap();
            prop_assert_eq!(block.compressed_size() % 4, 0);
            prop_assert_eq!(decompress(&block.to_bytes()).unwrap(), payload);
        }

        #[test]
        fn compress_then_decompress_noise(
            payload in prop::collection::vec(any::<u8>(), 257..2000),
        ) {
            let bytes = compress_to_vec(&payload).unwrap();
            prop_assert_eq!(decompress(&bytes).unwrap(), payload);
        }
    }
}
