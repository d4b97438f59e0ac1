//! Benchmark utilities.

use cpk_testkit::{kind, CpkImageBuilder, FixtureValue, UtfTableBuilder};
use rand::Rng;

/// Random bytes; CRILAYLA's worst case.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Text-like bytes: short random words drawn from a small vocabulary.
pub fn text_data(size: usize) -> Vec<u8> {
    const WORDS: [&[u8]; 8] = [
        b"cpk ", b"table ", b"row ", b"column ", b"offset ", b"data ", b"string ", b"\n",
    ];
    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(size + 8);
    while out.len() < size {
        out.extend_from_slice(WORDS[rng.gen_range(0..WORDS.len())]);
    }
    out.truncate(size);
    out
}

/// A TOC-shaped table with `rows` rows.
pub fn toc_table(rows: usize) -> Vec<u8> {
    let mut builder = UtfTableBuilder::new("CpkTocInfo")
        .column("DirName", kind::STRING)
        .column("FileName", kind::STRING)
        .column("FileSize", kind::U32)
        .column("ExtractSize", kind::U32)
        .column("FileOffset", kind::U64)
        .constant("UserString", FixtureValue::str("<NULL>"));
    for i in 0..rows {
        builder = builder.row(vec![
            FixtureValue::str(format!("dir{}", i % 16)),
            FixtureValue::str(format!("file{i}.bin")),
            FixtureValue::U32(i as u32 * 64),
            FixtureValue::U32(i as u32 * 64),
            FixtureValue::U64(i as u64 * 0x800),
        ]);
    }
    builder.build()
}

/// An archive with `files` raw entries of `size` bytes each.
pub fn archive_image(files: usize, size: usize) -> Vec<u8> {
    (0..files)
        .fold(CpkImageBuilder::new(), |builder, i| {
            builder.file(format!("dir{}", i % 4), format!("file{i}.bin"), text_data(size))
        })
        .build()
}
