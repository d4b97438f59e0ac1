//! CRILAYLA decoder.

use crate::backref::BackreferenceOp;
use crate::bitstream::BitReader;
use crate::block::{ContainerHeader, HEADER_LEN, RAW_BLOCK_LEN};
use crate::error::{CodecError, CodecResult};
use tracing::{debug, trace};

/// Decompress a complete CRILAYLA container.
///
/// Returns the reconstructed payload: the 256 raw bytes followed by the
/// `uncompressed_size` decoded bytes.
///
/// # Errors
///
/// Returns an error if the signature is unknown, the declared sizes do not
/// match `container.len()`, or the bitstream is truncated or malformed.
pub fn decompress(container: &[u8]) -> CodecResult<Vec<u8>> {
    CrilaylaDecoder::new(container)?.decode()
}

/// A CRILAYLA decoder over one container.
///
/// The output is produced from its last byte toward its first. Bytes
/// already written become the source of later backreferences, including
/// bytes written earlier in the same copy.
#[derive(Debug)]
pub struct CrilaylaDecoder<'a> {
    container: &'a [u8],
    header: ContainerHeader,
}

impl<'a> CrilaylaDecoder<'a> {
    /// Validates the container header against the supplied bytes.
    ///
    /// A declared body larger than the bitstream could ever produce is
    /// rejected before any output is allocated.
    ///
    /// An all-zero magic is accepted and decoded the same way; callers that
    /// treat zero-magic entries as stored raw should check
    /// [`ContainerHeader::magic`] first.
    pub fn new(container: &'a [u8]) -> CodecResult<Self> {
        let header = ContainerHeader::parse(container)?;
        header.check_len(container.len() as u64)?;
        header.check_body_len()?;
        Ok(Self { container, header })
    }

    /// The parsed container header.
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Decode the container.
    pub fn decode(&self) -> CodecResult<Vec<u8>> {
        let body_len = self.header.uncompressed_size as usize;
        let raw_start = HEADER_LEN + self.header.compressed_size as usize;

        let mut output = vec![0u8; RAW_BLOCK_LEN + body_len];
        output[..RAW_BLOCK_LEN]
            .copy_from_slice(&self.container[raw_start..raw_start + RAW_BLOCK_LEN]);

        let mut reader = BitReader::with_bounds(self.container, HEADER_LEN, raw_start);
        let output_end = RAW_BLOCK_LEN + body_len - 1;
        let mut produced = 0usize;

        while produced < body_len {
            let dest = output_end - produced;

            if reader.read_bit()? {
                let op = BackreferenceOp::read(&mut reader)?;
                let source = dest + op.distance();
                let remaining = body_len - produced;

                if source > output_end {
                    return Err(CodecError::invalid_backreference(
                        dest,
                        format!("source {source} lies past the end of output ({output_end})"),
                    ));
                }
                if op.length > remaining as u64 {
                    return Err(CodecError::invalid_backreference(
                        dest,
                        format!("copy of {} bytes exceeds the {remaining} still owed", op.length),
                    ));
                }

                trace!(dest, source, length = op.length, "backreference");

                // Source and destination may overlap; each byte must see the
                // ones written before it.
                let length = op.length as usize;
                for step in 0..length {
                    output[dest - step] = output[source - step];
                }
                produced += length;
            } else {
                output[dest] = reader.read_bits(8)? as u8;
                produced += 1;
            }
        }

        debug!(
            compressed = self.header.compressed_size,
            uncompressed = self.header.uncompressed_size,
            consumed = reader.bytes_consumed(raw_start),
            "decompressed CRILAYLA block"
        );

        Ok(output)
    }
}
