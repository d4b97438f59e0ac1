//! Compress and decompress command implementations.

use cpk_core::{crilayla_decode, crilayla_encode};
use cpk_storage::{FileBackend, StorageBackend};
use std::path::Path;
use tracing::info;

/// Which direction to run the codec in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Payload to CRILAYLA container.
    Compress,
    /// CRILAYLA container to payload.
    Decompress,
}

/// Runs the compress or decompress command.
///
/// Reads `length` bytes at `offset` of `input` (the rest of the file when
/// `length` is omitted) and writes the result to `output`.
pub fn run(
    direction: Direction,
    input: &Path,
    output: &Path,
    offset: u64,
    length: Option<u64>,
) -> Result<u64, Box<dyn std::error::Error>> {
    let source = FileBackend::open_read_only(input)?;
    let size = source.size()?;
    if offset > size {
        return Err(format!("offset {offset:#x} is past the end of {input:?} ({size} bytes)").into());
    }
    let length = length.unwrap_or(size - offset);

    let mut sink = FileBackend::create(output)?;
    let written = match direction {
        Direction::Compress => crilayla_encode(&source, offset, length, &mut sink)?,
        Direction::Decompress => crilayla_decode(&source, offset, length, &mut sink)?,
    };
    sink.flush()?;

    info!("{:?} {:?} -> {:?}", direction, input, output);
    println!("{length} bytes -> {written} bytes");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn compress_then_decompress_files() {
        let dir = tempdir().unwrap();
        let payload: Vec<u8> = (0..5000u32).map(|i| (i % 31) as u8).collect();
        let mut framed = b"HEAD".to_vec();
        framed.extend_from_slice(&payload);
        let input = dir.path().join("input.bin");
        std::fs::write(&input, &framed).unwrap();

        let packed = dir.path().join("packed.crilayla");
        let written = run(Direction::Compress, &input, &packed, 4, None).unwrap();
        assert_eq!(std::fs::metadata(&packed).unwrap().len(), written);

        let restored = dir.path().join("restored.bin");
        run(Direction::Decompress, &packed, &restored, 0, Some(written)).unwrap();
        assert_eq!(std::fs::read(&restored).unwrap(), payload);
    }

    #[test]
    fn offset_past_end() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("tiny.bin");
        std::fs::write(&input, [1, 2, 3]).unwrap();
        assert!(run(Direction::Compress, &input, &dir.path().join("o"), 9, None).is_err());
    }
}
