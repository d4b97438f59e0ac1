//! Property tests over testkit-generated payloads.

use cpk_crilayla::{
    compress, decompress, length_bits, read_length, write_length, BitReader, BitWriter,
    CodecError, CrilaylaEncoder, RAW_BLOCK_LEN,
};
use cpk_testkit::{
    backref_length_strategy, long_run_payload_strategy, payload_strategy, small_payload_strategy,
    PropTestConfig,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn mixed_payloads_survive(payload in payload_strategy(4096)) {
        let block = compress(&payload).unwrap();
        prop_assert_eq!(block.compressed_size() % 4, 0);
        prop_assert_eq!(decompress(&block.to_bytes()).unwrap(), payload);
    }

    #[test]
    fn long_runs_use_backreferences(payload in long_run_payload_strategy()) {
        let (block, stats) = CrilaylaEncoder::new(&payload).unwrap().encode_with_stats().unwrap();
        prop_assert!(stats.backreferences > 0);
        prop_assert!(stats.copied >= 200);
        prop_assert_eq!(
            stats.literals + stats.copied,
            (payload.len() - RAW_BLOCK_LEN) as u64
        );
        prop_assert_eq!(decompress(&block.to_bytes()).unwrap(), payload);
    }

    #[test]
    fn small_payloads_are_rejected(payload in small_payload_strategy()) {
        let rejected = matches!(
            compress(&payload),
            Err(CodecError::InputTooSmall { len, .. }) if len == payload.len()
        );
        prop_assert!(rejected);
    }

    #[test]
    fn lengths_near_field_boundaries(length in backref_length_strategy()) {
        let mut writer = BitWriter::new();
        write_length(&mut writer, length);
        prop_assert_eq!(writer.bit_len() as u64, length_bits(length));

        let mut stream = writer.finalize();
        stream.reverse();
        let mut reader = BitReader::new(&stream);
        prop_assert_eq!(read_length(&mut reader).unwrap(), length);
    }
}
