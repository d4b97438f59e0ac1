//! The string table of a @UTF table.

use crate::error::{UtfError, UtfResult};

/// NUL-terminated strings addressed by byte offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    bytes: Vec<u8>,
}

impl StringTable {
    /// Wraps the raw string table region.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Looks up the string starting at `offset`.
    ///
    /// The string runs to the first NUL or to the end of the table. Invalid
    /// UTF-8 is replaced with U+FFFD. An offset equal to the table length
    /// yields the empty string.
    pub fn get(&self, offset: u32) -> UtfResult<String> {
        let start = offset as usize;
        let tail = self.bytes.get(start..).ok_or(UtfError::StringOutOfRange {
            string_offset: offset,
            len: self.bytes.len(),
        })?;
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
    }

    /// Length of the region in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the region is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw region.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
