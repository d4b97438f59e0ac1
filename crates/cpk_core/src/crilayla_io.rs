//! CRILAYLA and raw copies between storage backends.

use crate::error::{CoreError, CoreResult};
use cpk_crilayla::{compress, CrilaylaDecoder};
use cpk_storage::StorageBackend;
use tracing::debug;

/// Chunk size for raw copies.
pub const COPY_CHUNK: usize = 1 << 20;

/// Decodes the CRILAYLA container at `entry_offset` and appends the payload
/// to `sink`.
///
/// Returns the number of bytes written. Nothing is appended when decoding
/// fails.
pub fn crilayla_decode<S, W>(
    source: &S,
    entry_offset: u64,
    entry_size: u64,
    sink: &mut W,
) -> CoreResult<u64>
where
    S: StorageBackend + ?Sized,
    W: StorageBackend + ?Sized,
{
    let container = source.read_at(entry_offset, region_len(entry_size)?)?;
    let decoder = CrilaylaDecoder::new(&container)?;
    let payload = decoder.decode()?;
    sink.append(&payload)?;
    debug!(
        entry_offset,
        entry_size,
        magic = ?decoder.header().magic,
        written = payload.len(),
        "decoded CRILAYLA entry"
    );
    Ok(payload.len() as u64)
}

/// Compresses `entry_size` bytes at `entry_offset` into a CRILAYLA
/// container appended to `sink`.
///
/// Returns the number of bytes written.
pub fn crilayla_encode<S, W>(
    source: &S,
    entry_offset: u64,
    entry_size: u64,
    sink: &mut W,
) -> CoreResult<u64>
where
    S: StorageBackend + ?Sized,
    W: StorageBackend + ?Sized,
{
    let payload = source.read_at(entry_offset, region_len(entry_size)?)?;
    let container = compress(&payload)?.to_bytes();
    sink.append(&container)?;
    debug!(
        entry_offset,
        entry_size,
        written = container.len(),
        "encoded CRILAYLA entry"
    );
    Ok(container.len() as u64)
}

/// Appends `size` bytes at `offset` to `sink` unchanged.
pub fn copy_range<S, W>(source: &S, offset: u64, size: u64, sink: &mut W) -> CoreResult<u64>
where
    S: StorageBackend + ?Sized,
    W: StorageBackend + ?Sized,
{
    let mut copied = 0u64;
    while copied < size {
        let chunk = (size - copied).min(COPY_CHUNK as u64) as usize;
        let bytes = source.read_at(offset + copied, chunk)?;
        sink.append(&bytes)?;
        copied += chunk as u64;
    }
    Ok(copied)
}

fn region_len(size: u64) -> CoreResult<usize> {
    usize::try_from(size).map_err(|_| CoreError::value_too_large("entry size", size, usize::MAX as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpk_crilayla::{CodecError, HEADER_LEN, RAW_BLOCK_LEN};
    use cpk_storage::InMemoryBackend;

    fn payload() -> Vec<u8> {
        (0..2000u32).map(|i| (i % 13) as u8 ^ (i / 97) as u8).collect()
    }

    #[test]
    fn encode_then_decode_through_storage() {
        let data = payload();
        let mut image = vec![0xEE; 5];
        image.extend_from_slice(&data);
        let source = InMemoryBackend::with_data(image);

        let mut packed = InMemoryBackend::new();
        let written = crilayla_encode(&source, 5, data.len() as u64, &mut packed).unwrap();
        assert_eq!(written, packed.size().unwrap());
        assert!(written < data.len() as u64);

        let mut unpacked = InMemoryBackend::new();
        let restored = crilayla_decode(&packed, 0, written, &mut unpacked).unwrap();
        assert_eq!(restored, data.len() as u64);
        assert_eq!(unpacked.into_data(), data);
    }

    #[test]
    fn decode_appends_after_existing_sink_bytes() {
        let data = payload();
        let container = cpk_crilayla::compress_to_vec(&data).unwrap();
        let source = InMemoryBackend::with_data(container.clone());

        let mut sink = InMemoryBackend::with_data(b"head".to_vec());
        crilayla_decode(&source, 0, container.len() as u64, &mut sink).unwrap();
        let out = sink.into_data();
        assert_eq!(&out[..4], b"head");
        assert_eq!(&out[4..], &data[..]);
    }

    #[test]
    fn failed_decode_writes_nothing() {
        let mut garbage = vec![0u8; HEADER_LEN + RAW_BLOCK_LEN];
        garbage[..8].copy_from_slice(b"NOTLAYLA");
        let source = InMemoryBackend::with_data(garbage.clone());
        let mut sink = InMemoryBackend::new();
        let err = crilayla_decode(&source, 0, garbage.len() as u64, &mut sink).unwrap_err();
        assert!(matches!(err, CoreError::Codec(CodecError::BadSignature { .. })));
        assert_eq!(sink.size().unwrap(), 0);
    }

    #[test]
    fn small_input_is_rejected() {
        let source = InMemoryBackend::with_data(vec![1u8; 100]);
        let mut sink = InMemoryBackend::new();
        assert!(matches!(
            crilayla_encode(&source, 0, 100, &mut sink),
            Err(CoreError::Codec(CodecError::InputTooSmall { .. }))
        ));
    }

    #[test]
    fn region_past_end() {
        let source = InMemoryBackend::with_data(vec![0u8; 10]);
        let mut sink = InMemoryBackend::new();
        assert!(matches!(
            crilayla_decode(&source, 4, 100, &mut sink),
            Err(CoreError::Storage(_))
        ));
    }

    #[test]
    fn copy_range_copies_exactly() {
        let source = InMemoryBackend::with_data((0..=255u8).collect());
        let mut sink = InMemoryBackend::new();
        assert_eq!(copy_range(&source, 16, 32, &mut sink).unwrap(), 32);
        assert_eq!(sink.into_data(), (16..48u8).collect::<Vec<_>>());

        let mut sink = InMemoryBackend::new();
        assert_eq!(copy_range(&source, 0, 0, &mut sink).unwrap(), 0);
    }
}
