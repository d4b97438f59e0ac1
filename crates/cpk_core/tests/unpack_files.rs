//! Unpacking archives read from disk.

use cpk_core::{CpkArchive, ErrorPolicy, UnpackConfig, Unpacker};
use cpk_crilayla::compress_to_vec;
use cpk_storage::FileBackend;
use cpk_testkit::{CpkImageBuilder, CpkLayout, TempArchive};
use std::fs;

fn text(lines: usize) -> Vec<u8> {
    (0..lines)
        .flat_map(|i| format!("line {i}: the quick brown fox\n").into_bytes())
        .collect()
}

#[test]
fn unpack_archive_file() {
    let script = text(200);
    let image = CpkImageBuilder::new()
        .layout(CpkLayout::ContentFirst)
        .stored("script", "main.txt", compress_to_vec(&script).unwrap(), script.len() as u32)
        .file("", "icon.bin", vec![9; 64])
        .build();
    let archive = TempArchive::new("game.cpk", &image);
    let source = FileBackend::open_read_only(archive.path()).unwrap();

    let opened = CpkArchive::open(&source).unwrap();
    let entries = opened.entries(&source).unwrap();
    assert!(entries[0].is_compressed());
    assert!(!entries[1].is_compressed());

    let out = archive.dir().join("game.cpk_unpacked");
    let report = Unpacker::new(UnpackConfig::new().output_dir(&out))
        .unpack_archive(&source, &opened)
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(fs::read(out.join("script/main.txt")).unwrap(), script);
    assert_eq!(fs::read(out.join("icon.bin")).unwrap(), vec![9; 64]);
}

#[test]
fn truncated_archive_fails_per_entry() {
    let image = CpkImageBuilder::new()
        .file("", "a.bin", vec![1; 32])
        .file("", "b.bin", vec![2; 4096])
        .build();
    // cut into the last file's bytes
    let truncated = &image[..image.len() - 100];
    let archive = TempArchive::new("cut.cpk", truncated);
    let source = FileBackend::open_read_only(archive.path()).unwrap();

    let out = archive.dir().join("out");
    let report = Unpacker::new(
        UnpackConfig::new()
            .output_dir(&out)
            .error_policy(ErrorPolicy::Skip),
    )
    .unpack(&source)
    .unwrap();
    assert_eq!(report.extracted.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path.as_deref(), Some("b.bin"));
    assert!(!out.join("b.bin").exists());
}
