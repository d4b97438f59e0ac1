//! Backreference operations and their variable-length length field.
//!
//! A backreference is encoded as a `1` flag bit, a 13-bit window offset and
//! a length. The length carries an implicit base of 3 and is spread over
//! fields of 2, 3 and 5 bits followed by any number of 8-bit fields; a field
//! that is all ones means "keep reading".

use crate::bitstream::{BitReader, BitWriter};
use crate::error::CodecResult;

/// Width of the window offset field.
pub const OFFSET_BITS: u32 = 13;

/// Number of distinct window offsets.
pub const WINDOW_SIZE: usize = 1 << OFFSET_BITS;

/// Implicit distance added to every window offset.
pub const OFFSET_BIAS: usize = 3;

/// Shortest copy a backreference can describe.
pub const MIN_MATCH: u64 = 3;

/// Widths of the leading length fields, before the repeating 8-bit tail.
const LENGTH_FIELDS: [u32; 3] = [2, 3, 5];

/// Width of the repeating tail field.
const TAIL_FIELD: u32 = 8;

/// One decoded or to-be-encoded backreference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackreferenceOp {
    /// Raw 13-bit window offset (the copy source sits `offset + 3` bytes away).
    pub offset: u16,
    /// Number of bytes to copy, at least [`MIN_MATCH`].
    pub length: u64,
}

impl BackreferenceOp {
    /// Reads the offset and length that follow a `1` flag bit.
    pub fn read(reader: &mut BitReader<'_>) -> CodecResult<Self> {
        let offset = reader.read_bits(OFFSET_BITS)?;
        let length = read_length(reader)?;
        Ok(Self { offset, length })
    }

    /// Writes the flag bit, offset and length.
    pub fn write(&self, writer: &mut BitWriter) {
        writer.push_bit(true);
        writer.push_bits(u32::from(self.offset), OFFSET_BITS);
        write_length(writer, self.length);
    }

    /// Distance from the write position to the first source byte.
    #[must_use]
    pub fn distance(&self) -> usize {
        usize::from(self.offset) + OFFSET_BIAS
    }
}

/// Decodes a backreference length.
pub fn read_length(reader: &mut BitReader<'_>) -> CodecResult<u64> {
    let mut length = MIN_MATCH;

    for width in LENGTH_FIELDS {
        let field = reader.read_bits(width)?;
        length += u64::from(field);
        if field != all_ones(width) {
            return Ok(length);
        }
    }

    loop {
        let field = reader.read_bits(TAIL_FIELD)?;
        length += u64::from(field);
        if field != all_ones(TAIL_FIELD) {
            return Ok(length);
        }
    }
}

/// Encodes a backreference length (must be at least [`MIN_MATCH`]).
pub fn write_length(writer: &mut BitWriter, length: u64) {
    debug_assert!(length >= MIN_MATCH, "backreference length {length} below minimum");
    let mut rest = length.saturating_sub(MIN_MATCH);

    for width in LENGTH_FIELDS {
        let max = u64::from(all_ones(width));
        if rest < max {
            writer.push_bits(rest as u32, width);
            return;
        }
        writer.push_bits(max as u32, width);
        rest -= max;
    }

    let max = u64::from(all_ones(TAIL_FIELD));
    while rest >= max {
        writer.push_bits(max as u32, TAIL_FIELD);
        rest -= max;
    }
    writer.push_bits(rest as u32, TAIL_FIELD);
}

/// Number of bits `write_length` spends on `length`.
#[must_use]
pub fn length_bits(length: u64) -> u64 {
    let mut rest = length.saturating_sub(MIN_MATCH);
    let mut bits = 0;

    for width in LENGTH_FIELDS {
        bits += u64::from(width);
        let max = u64::from(all_ones(width));
        if rest < max {
            return bits;
        }
        rest -= max;
    }

    bits + u64::from(TAIL_FIELD) * (rest / u64::from(all_ones(TAIL_FIELD)) + 1)
}

#[inline]
const fn all_ones(width: u32) -> u16 {
    ((1u32 << width) - 1) as u16
}
