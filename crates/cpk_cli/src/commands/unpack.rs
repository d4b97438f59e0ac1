//! Unpack command implementation.

use cpk_core::{CpkArchive, ErrorPolicy, UnpackConfig, UnpackReport, Unpacker};
use cpk_storage::FileBackend;
use std::path::{Path, PathBuf};
use tracing::info;

/// Options for the unpack command.
#[derive(Debug, Clone)]
pub struct UnpackOptions {
    /// Output directory; defaults to `<archive name>_unpacked`.
    pub output: Option<PathBuf>,
    /// Continue past failing entries.
    pub skip_errors: bool,
    /// Do not compare decoded sizes with `ExtractSize`.
    pub no_verify: bool,
    /// Keep existing files.
    pub no_overwrite: bool,
}

/// Runs the unpack command.
pub fn run(archive: &Path, options: &UnpackOptions) -> Result<UnpackReport, Box<dyn std::error::Error>> {
    let config = build_config(archive, options);
    info!("Unpacking {:?} into {:?}", archive, config.output_dir);

    let source = FileBackend::open_read_only(archive)?;
    let opened = CpkArchive::open(&source)?;
    let report = Unpacker::new(config).unpack_archive(&source, &opened)?;

    println!(
        "Extracted {} of {} files ({} bytes) to {}",
        report.extracted.len(),
        report.entries,
        report.bytes_written(),
        report.output_dir.display()
    );
    for failure in &report.failed {
        println!(
            "  failed: #{} {}: {}",
            failure.index,
            failure.path.as_deref().unwrap_or("?"),
            failure.error
        );
    }

    if report.failed.is_empty() {
        Ok(report)
    } else {
        Err(format!("{} entries could not be extracted", report.failed.len()).into())
    }
}

fn build_config(archive: &Path, options: &UnpackOptions) -> UnpackConfig {
    let config = match &options.output {
        Some(dir) => UnpackConfig::new().output_dir(dir),
        None => UnpackConfig::for_archive(archive),
    };
    config
        .error_policy(if options.skip_errors {
            ErrorPolicy::Skip
        } else {
            ErrorPolicy::Abort
        })
        .verify_extract_size(!options.no_verify)
        .overwrite(!options.no_overwrite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpk_testkit::{CpkImageBuilder, TempArchive};

    fn options(output: PathBuf) -> UnpackOptions {
        UnpackOptions {
            output: Some(output),
            skip_errors: false,
            no_verify: false,
            no_overwrite: false,
        }
    }

    #[test]
    fn flags_map_onto_config() {
        let mut opts = options(PathBuf::from("out"));
        opts.skip_errors = true;
        opts.no_verify = true;
        let config = build_config(Path::new("a.cpk"), &opts);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.error_policy, ErrorPolicy::Skip);
        assert!(!config.verify_extract_size);
        assert!(config.overwrite);

        opts.output = None;
        let config = build_config(Path::new("dir/a.cpk"), &opts);
        assert_eq!(config.output_dir, PathBuf::from("a.cpk_unpacked"));
    }

    #[test]
    fn unpacks_archive_file() {
        let image = CpkImageBuilder::new()
            .file("docs", "readme.txt", b"cpk".to_vec())
            .build();
        let archive = TempArchive::new("small.cpk", &image);
        let out = archive.dir().join("out");

        let report = run(archive.path(), &options(out.clone())).unwrap();
        assert!(report.is_complete());
        assert_eq!(std::fs::read(out.join("docs/readme.txt")).unwrap(), b"cpk");
    }

    #[test]
    fn skipped_entries_fail_the_command() {
        let image = CpkImageBuilder::new()
            .stored("", "bad.bin", vec![0x11; 300], 900)
            .build();
        let archive = TempArchive::new("bad.cpk", &image);
        let mut opts = options(archive.dir().join("out"));
        opts.skip_errors = true;
        assert!(run(archive.path(), &opts).is_err());
    }
}
