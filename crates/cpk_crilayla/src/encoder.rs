//! CRILAYLA encoder.

use crate::bitstream::BitWriter;
use crate::block::{CompressedBlock, Magic, RAW_BLOCK_LEN};
use crate::error::{CodecError, CodecResult};
use crate::matcher::MatchFinder;
use tracing::debug;

/// Compress a payload into a CRILAYLA block.
///
/// The first 256 bytes are stored raw; the rest is encoded from its last
/// byte toward its first with a greedy longest-match search.
///
/// # Errors
///
/// Returns [`CodecError::InputTooSmall`] if `payload.len() <= 256`.
pub fn compress(payload: &[u8]) -> CodecResult<CompressedBlock> {
    CrilaylaEncoder::new(payload)?.encode()
}

/// Compress a payload and serialize the container in one step.
///
/// # Errors
///
/// See [`compress`].
pub fn compress_to_vec(payload: &[u8]) -> CodecResult<Vec<u8>> {
    Ok(compress(payload)?.to_bytes())
}

/// Counters gathered while encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Bytes emitted as 9-bit literals.
    pub literals: u64,
    /// Backreference operations emitted.
    pub backreferences: u64,
    /// Bytes covered by backreferences.
    pub copied: u64,
}

/// A CRILAYLA encoder over one payload.
pub struct CrilaylaEncoder<'a> {
    header_block: [u8; RAW_BLOCK_LEN],
    body: &'a [u8],
    writer: BitWriter,
    stats: EncodeStats,
}

impl<'a> CrilaylaEncoder<'a> {
    /// Create an encoder, splitting off the raw header block.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InputTooSmall`] for payloads of 256 bytes or
    /// fewer, and [`CodecError::ValueTooLarge`] if the body does not fit the
    /// 32-bit size field.
    pub fn new(payload: &'a [u8]) -> CodecResult<Self> {
        if payload.len() <= RAW_BLOCK_LEN {
            return Err(CodecError::InputTooSmall {
                len: payload.len(),
                min: RAW_BLOCK_LEN,
            });
        }

        let (head, body) = payload.split_at(RAW_BLOCK_LEN);
        if u32::try_from(body.len()).is_err() {
            return Err(CodecError::ValueTooLarge {
                value: body.len() as u64,
                field: "uncompressed_size",
            });
        }

        let mut header_block = [0u8; RAW_BLOCK_LEN];
        header_block.copy_from_slice(head);

        Ok(Self {
            header_block,
            body,
            writer: BitWriter::with_capacity(body.len() / 2),
            stats: EncodeStats::default(),
        })
    }

    /// Encode the body and assemble the block.
    pub fn encode(self) -> CodecResult<CompressedBlock> {
        self.encode_with_stats().map(|(block, _)| block)
    }

    /// Encode the body, also returning what the encoder emitted.
    pub fn encode_with_stats(mut self) -> CodecResult<(CompressedBlock, EncodeStats)> {
        let finder = MatchFinder::new(self.body);
        let mut remaining = self.body.len();

        while remaining > 0 {
            let pos = remaining - 1;
            match finder.longest(pos) {
                Some(op) => {
                    op.write(&mut self.writer);
                    self.stats.backreferences += 1;
                    self.stats.copied += op.length;
                    remaining -= op.length as usize;
                }
                None => {
                    self.writer.push_bit(false);
                    self.writer.push_bits(u32::from(self.body[pos]), 8);
                    self.stats.literals += 1;
                    remaining -= 1;
                }
            }
        }

        let mut compressed_data = self.writer.finalize();
        if u32::try_from(compressed_data.len()).is_err() {
            return Err(CodecError::ValueTooLarge {
                value: compressed_data.len() as u64,
                field: "compressed_size",
            });
        }
        compressed_data.reverse();

        debug!(
            uncompressed = self.body.len(),
            compressed = compressed_data.len(),
            literals = self.stats.literals,
            backreferences = self.stats.backreferences,
            "compressed CRILAYLA block"
        );

        let block = CompressedBlock {
            magic: Magic::Crilayla,
            uncompressed_size: self.body.len() as u32,
            compressed_data,
            header_block: self.header_block,
        };
        Ok((block, self.stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decompress;

    fn with_body(body: &[u8]) -> Vec<u8> {
        let mut payload: Vec<u8> = (0..=255u8).collect();
        payload.extend_from_slice(body);
        payload
    }

    #[test]
    fn rejects_small_inputs() {
        for len in [0, 1, 255, 256] {
            assert_eq!(
                compress(&vec![0u8; len]),
                Err(CodecError::InputTooSmall { len, min: 256 })
            );
        }
    }

    #[test]
    fn smallest_input_compresses() {
        let payload = with_body(&[0x42]);
        let block = compress(&payload).unwrap();
        assert_eq!(block.uncompressed_size, 1);
        assert_eq!(block.compressed_size() % 4, 0);
        assert_eq!(decompress(&block.to_bytes()).unwrap(), payload);
    }

    #[test]
    fn three_literal_body_is_bit_exact() {
        let mut payload = vec![0u8; 256];
        payload.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        let block = compress(&payload).unwrap();
        assert_eq!(block.compressed_data, vec![0x40, 0xD5, 0x2E, 0x66]);
        assert_eq!(block.to_bytes().len(), 16 + 4 + 256);
    }

    #[test]
    fn long_run_uses_one_backreference() {
        let payload = with_body(&[0x5A; 300]);
        let (block, stats) = CrilaylaEncoder::new(&payload)
            .unwrap()
            .encode_with_stats()
            .unwrap();

        // The last three bytes have no window yet and index 0 never matches.
        assert_eq!(
            stats,
            EncodeStats {
                literals: 4,
                backreferences: 1,
                copied: 296,
            }
        );
        assert_eq!(decompress(&block.to_bytes()).unwrap(), payload);
    }

    #[test]
    fn stats_account_for_every_byte() {
        let body: Vec<u8> = b"the quick brown fox jumps over the lazy dog; the quick brown fox"
            .iter()
            .copied()
            .cycle()
            .take(2000)
            .collect();
        let payload = with_body(&body);
        let (_, stats) = CrilaylaEncoder::new(&payload)
            .unwrap()
            .encode_with_stats()
            .unwrap();
        assert_eq!(stats.literals + stats.copied, body.len() as u64);
        assert!(stats.backreferences > 0);
    }

    #[test]
    fn repetitive_data_shrinks() {
        let body: Vec<u8> = (0..8000u32).map(|i| (i % 17) as u8).collect();
        let payload = with_body(&body);
        let bytes = compress_to_vec(&payload).unwrap();
        assert!(bytes.len() < payload.len() / 4);
        assert_eq!(decompress(&bytes).unwrap(), payload);
    }

    #[test]
    fn header_block_is_verbatim() {
        let payload = with_body(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let block = compress(&payload).unwrap();
        assert_eq!(&block.header_block[..], &payload[..256]);
    }
}
