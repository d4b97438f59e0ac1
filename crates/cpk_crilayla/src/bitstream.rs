//! Reverse-order bitstream primitives.
//!
//! CRILAYLA streams are consumed from the last byte toward the first, and
//! within each byte from the most significant bit down. Multi-bit fields
//! are MSB-first.
//!
//! The writer produces bytes in forward order; the encoder reverses the
//! finished buffer exactly once when it is placed in the container.

use crate::error::{CodecError, CodecResult};

/// Reads bit fields from a byte range, walking toward lower addresses.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Index one past the next byte to load.
    cursor: usize,
    /// Lowest index that may be loaded.
    floor: usize,
    pool: u8,
    bits_left: u32,
}

impl<'a> BitReader<'a> {
    /// Creates a reader over all of `data`, starting at its last byte.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_bounds(data, 0, data.len())
    }

    /// Creates a reader over `data[floor..end]`, starting at `data[end - 1]`.
    ///
    /// Reads that would need a byte below `floor` fail with
    /// [`CodecError::UnexpectedEndOfInput`].
    pub fn with_bounds(data: &'a [u8], floor: usize, end: usize) -> Self {
        let end = end.min(data.len());
        Self {
            data,
            cursor: end,
            floor: floor.min(end),
            pool: 0,
            bits_left: 0,
        }
    }

    /// Reads a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> CodecResult<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Reads a `count`-bit field (1..=16), most significant bit first.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEndOfInput`] if the range is exhausted
    /// before `count` bits were produced.
    pub fn read_bits(&mut self, count: u32) -> CodecResult<u16> {
        debug_assert!((1..=16).contains(&count), "bit count {count} out of range");

        let mut out: u16 = 0;
        let mut produced = 0;

        while produced < count {
            if self.bits_left == 0 {
                if self.cursor <= self.floor {
                    return Err(CodecError::UnexpectedEndOfInput { offset: self.floor });
                }
                self.cursor -= 1;
                self.pool = self.data[self.cursor];
                self.bits_left = 8;
            }

            let take = self.bits_left.min(count - produced);
            let mask = ((1u16 << take) - 1) as u8;
            let bits = (self.pool >> (self.bits_left - take)) & mask;

            out = (out << take) | u16::from(bits);
            self.bits_left -= take;
            produced += take;
        }

        Ok(out)
    }

    /// Number of whole bytes loaded so far.
    #[must_use]
    pub fn bytes_consumed(&self, end: usize) -> usize {
        end.saturating_sub(self.cursor)
    }
}

/// Accumulates bit fields MSB-first into a forward-growing byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    pending_bits: u32,
    pending_count: u32,
}

impl BitWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with room for `capacity` finished bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Appends a single bit.
    #[inline]
    pub fn push_bit(&mut self, bit: bool) {
        self.push_bits(u32::from(bit), 1);
    }

    /// Appends the low `width` bits of `value` (1..=16), MSB first.
    pub fn push_bits(&mut self, value: u32, width: u32) {
        debug_assert!((1..=16).contains(&width), "bit width {width} out of range");

        let mask = (1u32 << width) - 1;
        self.pending_bits = (self.pending_bits << width) | (value & mask);
        self.pending_count += width;

        while self.pending_count >= 8 {
            self.pending_count -= 8;
            self.bytes.push((self.pending_bits >> self.pending_count) as u8);
        }
        self.pending_bits &= (1u32 << self.pending_count) - 1;
    }

    /// Total number of bits written so far.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.pending_count as usize
    }

    /// Pads with zero bits to a byte boundary, then with zero bytes to a
    /// multiple of four, and returns the buffer in write order.
    #[must_use]
    pub fn finalize(mut self) -> Vec<u8> {
        if self.pending_count > 0 {
            let pad = 8 - self.pending_count;
            self.push_bits(0, pad);
        }
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        self.bytes
    }
}
