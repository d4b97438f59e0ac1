//! The CRILAYLA container layout.
//!
//! ```text
//! 0x00  8 bytes   magic "CRILAYLA" (or eight zero bytes)
//! 0x08  u32 LE    uncompressed size, excluding the raw header block
//! 0x0C  u32 LE    compressed size, always a multiple of 4
//! 0x10  ...       compressed bitstream, consumed back to front
//! ....  256 bytes first 256 bytes of the payload, stored raw
//! ```

use crate::error::{CodecError, CodecResult};

/// The eight signature bytes of a compressed entry.
pub const MAGIC: [u8; 8] = *b"CRILAYLA";

/// Length of the fixed container header.
pub const HEADER_LEN: usize = 0x10;

/// Length of the payload prefix that is stored uncompressed.
pub const RAW_BLOCK_LEN: usize = 0x100;

/// Which signature a container starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Magic {
    /// The literal `CRILAYLA`.
    Crilayla,
    /// Eight zero bytes; callers treat the entry as stored raw.
    Zero,
}

impl Magic {
    /// Classifies the first eight bytes of a container.
    pub fn from_bytes(bytes: [u8; 8]) -> CodecResult<Self> {
        if bytes == MAGIC {
            Ok(Self::Crilayla)
        } else if bytes == [0; 8] {
            Ok(Self::Zero)
        } else {
            Err(CodecError::BadSignature { found: bytes })
        }
    }

    /// The on-disk bytes for this signature.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 8] {
        match self {
            Self::Crilayla => MAGIC,
            Self::Zero => [0; 8],
        }
    }
}

/// Upper bound on body bytes one bitstream bit can produce. The cheapest
/// encoding is a long backreference at 8 bits per 255 copied bytes.
const MAX_BYTES_PER_BIT: u64 = 32;

/// The 16-byte header that precedes the compressed bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Signature found at offset 0.
    pub magic: Magic,
    /// Reconstructed length, excluding the raw block.
    pub uncompressed_size: u32,
    /// Length of the compressed bitstream.
    pub compressed_size: u32,
}

impl ContainerHeader {
    /// Parses the header at the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Fails with [`CodecError::UnexpectedEndOfInput`] when fewer than 16
    /// bytes are present and [`CodecError::BadSignature`] on an unknown magic.
    pub fn parse(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::UnexpectedEndOfInput {
                offset: bytes.len(),
            });
        }

        let magic = Magic::from_bytes(read_array(bytes, 0))?;
        let uncompressed_size = u32::from_le_bytes(read_array(bytes, 0x08));
        let compressed_size = u32::from_le_bytes(read_array(bytes, 0x0C));

        Ok(Self {
            magic,
            uncompressed_size,
            compressed_size,
        })
    }

    /// Offset of the raw block within the container.
    #[must_use]
    pub fn raw_block_offset(&self) -> u64 {
        HEADER_LEN as u64 + u64::from(self.compressed_size)
    }

    /// Total container length implied by the header.
    #[must_use]
    pub fn container_len(&self) -> u64 {
        self.raw_block_offset() + RAW_BLOCK_LEN as u64
    }

    /// Length of the payload this container reconstructs.
    #[must_use]
    pub fn payload_len(&self) -> u64 {
        u64::from(self.uncompressed_size) + RAW_BLOCK_LEN as u64
    }

    /// Largest body the declared bitstream could reconstruct.
    #[must_use]
    pub fn max_body_len(&self) -> u64 {
        u64::from(self.compressed_size) * 8 * MAX_BYTES_PER_BIT
    }

    /// Checks that the bitstream is long enough to produce the declared
    /// body.
    ///
    /// # Errors
    ///
    /// Fails with [`CodecError::SizeMismatch`] when `uncompressed_size`
    /// exceeds [`max_body_len`](Self::max_body_len).
    pub fn check_body_len(&self) -> CodecResult<()> {
        let declared = u64::from(self.uncompressed_size);
        let ceiling = self.max_body_len();
        if declared > ceiling {
            return Err(CodecError::SizeMismatch {
                expected: declared,
                actual: ceiling,
            });
        }
        Ok(())
    }

    /// Checks that the header describes exactly `actual` bytes.
    pub fn check_len(&self, actual: u64) -> CodecResult<()> {
        let expected = self.container_len();
        if expected != actual {
            return Err(CodecError::SizeMismatch { expected, actual });
        }
        Ok(())
    }
}

/// One compressed payload, ready to be serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBlock {
    /// Signature written at offset 0.
    pub magic: Magic,
    /// Length of the payload after the raw block.
    pub uncompressed_size: u32,
    /// The bitstream in on-disk order (the decoder reads it back to front).
    pub compressed_data: Vec<u8>,
    /// The first 256 payload bytes, verbatim.
    pub header_block: [u8; RAW_BLOCK_LEN],
}

impl CompressedBlock {
    /// Parses a complete container.
    ///
    /// # Errors
    ///
    /// Fails on a bad signature or when the declared sizes do not account
    /// for exactly `bytes.len()` bytes.
    pub fn parse(bytes: &[u8]) -> CodecResult<Self> {
        let header = ContainerHeader::parse(bytes)?;
        header.check_len(bytes.len() as u64)?;

        let raw_start = HEADER_LEN + header.compressed_size as usize;
        Ok(Self {
            magic: header.magic,
            uncompressed_size: header.uncompressed_size,
            compressed_data: bytes[HEADER_LEN..raw_start].to_vec(),
            header_block: read_array(bytes, raw_start),
        })
    }

    /// Length of the compressed bitstream.
    #[must_use]
    pub fn compressed_size(&self) -> u32 {
        self.compressed_data.len() as u32
    }

    /// The header fields of this block.
    #[must_use]
    pub fn header(&self) -> ContainerHeader {
        ContainerHeader {
            magic: self.magic,
            uncompressed_size: self.uncompressed_size,
            compressed_size: self.compressed_size(),
        }
    }

    /// Serialized length: `16 + compressed_size + 256`.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.compressed_data.len() + RAW_BLOCK_LEN
    }

    /// Appends the serialized container to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        out.extend_from_slice(&self.magic.to_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&self.compressed_size().to_le_bytes());
        out.extend_from_slice(&self.compressed_data);
        out.extend_from_slice(&self.header_block);
    }

    /// Serializes the container.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out);
        out
    }
}

fn read_array<const N: usize>(bytes: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[at..at + N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CompressedBlock {
        let mut header_block = [0u8; RAW_BLOCK_LEN];
        header_block[0] = 0x7F;
        header_block[255] = 0x01;
        CompressedBlock {
            magic: Magic::Crilayla,
            uncompressed_size: 3,
            compressed_data: vec![0x40, 0xD5, 0x2E, 0x66],
            header_block,
        }
    }

    #[test]
    fn layout_is_little_endian() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes.len(), 0x114);
        assert_eq!(&bytes[..8], b"CRILAYLA");
        assert_eq!(&bytes[8..12], &[3, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[4, 0, 0, 0]);
        assert_eq!(&bytes[16..20], &[0x40, 0xD5, 0x2E, 0x66]);
        assert_eq!(bytes[20], 0x7F);
    }

    #[test]
    fn parse_restores_block() {
        let block = sample();
        assert_eq!(CompressedBlock::parse(&block.to_bytes()).unwrap(), block);
    }

    #[test]
    fn zero_magic_is_accepted() {
        let mut bytes = sample().to_bytes();
        bytes[..8].fill(0);
        let header = ContainerHeader::parse(&bytes).unwrap();
        assert_eq!(header.magic, Magic::Zero);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[..8].copy_from_slice(b"CRILAYLB");
        assert!(matches!(
            ContainerHeader::parse(&bytes),
            Err(CodecError::BadSignature { .. })
        ));
    }

    #[test]
    fn truncated_container_is_a_size_mismatch() {
        let bytes = sample().to_bytes();
        assert_eq!(
            CompressedBlock::parse(&bytes[..bytes.len() - 1]),
            Err(CodecError::SizeMismatch {
                expected: 0x114,
                actual: 0x113
            })
        );
    }

    #[test]
    fn short_header_is_end_of_input() {
        assert_eq!(
            ContainerHeader::parse(b"CRILAYLA"),
            Err(CodecError::UnexpectedEndOfInput { offset: 8 })
        );
    }

    #[test]
    fn header_arithmetic() {
        let header = sample().header();
        assert_eq!(header.raw_block_offset(), 0x14);
        assert_eq!(header.container_len(), 0x114);
        assert_eq!(header.payload_len(), 259);
    }
}
