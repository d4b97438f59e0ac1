//! Extracting every entry of an archive to disk.

use crate::archive::CpkArchive;
use crate::config::{ErrorPolicy, UnpackConfig};
use crate::crilayla_io::{copy_range, crilayla_decode};
use crate::entry::CpkTocEntry;
use crate::error::{CoreError, CoreResult};
use cpk_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One extracted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedFile {
    /// TOC row index.
    pub index: u32,
    /// Path under the output directory.
    pub path: PathBuf,
    /// Absolute offset the stored bytes were read from.
    pub file_offset: u64,
    /// Bytes read from the archive.
    pub file_size: u32,
    /// Whether the entry was CRILAYLA-decoded.
    pub compressed: bool,
    /// Bytes written to disk.
    pub written: u64,
}

/// An entry skipped under [`ErrorPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntry {
    /// TOC row index.
    pub index: u32,
    /// `DirName/FileName`, when the row could be read.
    pub path: Option<String>,
    /// Rendered error.
    pub error: String,
}

/// Summary of an unpack run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnpackReport {
    /// Directory files were extracted under.
    pub output_dir: PathBuf,
    /// Entries listed in the TOC.
    pub entries: u32,
    /// Files written, in TOC order.
    pub extracted: Vec<ExtractedFile>,
    /// Entries that failed and were skipped.
    pub failed: Vec<FailedEntry>,
}

impl UnpackReport {
    /// Whether every entry was extracted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.extracted.len() as u64 == u64::from(self.entries)
    }

    /// Total bytes written.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.extracted.iter().map(|f| f.written).sum()
    }
}

/// Extracts archive entries under a configured output directory.
#[derive(Debug, Clone, Default)]
pub struct Unpacker {
    config: UnpackConfig,
}

impl Unpacker {
    /// Creates an unpacker.
    #[must_use]
    pub fn new(config: UnpackConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &UnpackConfig {
        &self.config
    }

    /// Opens the archive in `source` and extracts every entry.
    ///
    /// # Errors
    ///
    /// Fails if the archive cannot be opened. Entry failures abort the run
    /// under [`ErrorPolicy::Abort`] and are collected in the report under
    /// [`ErrorPolicy::Skip`].
    pub fn unpack<S: StorageBackend + ?Sized>(&self, source: &S) -> CoreResult<UnpackReport> {
        let archive = CpkArchive::open(source)?;
        self.unpack_archive(source, &archive)
    }

    /// Extracts every entry of an already opened archive.
    pub fn unpack_archive<S: StorageBackend + ?Sized>(
        &self,
        source: &S,
        archive: &CpkArchive,
    ) -> CoreResult<UnpackReport> {
        let mut report = UnpackReport {
            output_dir: self.config.output_dir.clone(),
            entries: archive.len(),
            ..UnpackReport::default()
        };

        for index in 0..archive.len() {
            let mut path = None;
            let result = archive.entry(source, index).and_then(|entry| {
                path = Some(entry.archive_path());
                self.extract(source, &entry)
            });

            match result {
                Ok(file) => report.extracted.push(file),
                Err(err) if self.config.error_policy == ErrorPolicy::Skip => {
                    warn!(index, path = path.as_deref().unwrap_or("?"), error = %err, "skipping entry");
                    report.failed.push(FailedEntry {
                        index,
                        path,
                        error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            output_dir = %report.output_dir.display(),
            extracted = report.extracted.len(),
            failed = report.failed.len(),
            bytes = report.bytes_written(),
            "unpack finished"
        );
        Ok(report)
    }

    /// Extracts one entry to `<output_dir>/<dir>/<file>`.
    ///
    /// Compressed entries are decoded before the output file is created;
    /// a partially written file is removed on failure.
    pub fn extract<S: StorageBackend + ?Sized>(
        &self,
        source: &S,
        entry: &CpkTocEntry,
    ) -> CoreResult<ExtractedFile> {
        let relative = entry.relative_path()?;
        let target = self.config.output_dir.join(&relative);
        info!(
            "{} {:#x} {}",
            entry.archive_path(),
            entry.file_offset,
            entry.file_size
        );

        if !self.config.overwrite && target.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", target.display()),
            )
            .into());
        }

        let written = if entry.is_compressed() {
            let mut decoded = cpk_storage::InMemoryBackend::new();
            let written = crilayla_decode(
                source,
                entry.file_offset,
                u64::from(entry.file_size),
                &mut decoded,
            )?;
            info!("   uncompressed to {written}");
            if self.config.verify_extract_size && written != u64::from(entry.extract_size) {
                return Err(CoreError::ExtractSizeMismatch {
                    path: entry.archive_path(),
                    expected: u64::from(entry.extract_size),
                    actual: written,
                });
            }
            write_file(&target, |sink| copy_range(&decoded, 0, written, sink))?
        } else {
            write_file(&target, |sink| {
                copy_range(source, entry.file_offset, u64::from(entry.file_size), sink)
            })?
        };

        Ok(ExtractedFile {
            index: entry.index,
            path: relative,
            file_offset: entry.file_offset,
            file_size: entry.file_size,
            compressed: entry.is_compressed(),
            written,
        })
    }
}

/// Creates `path` (and its parents), fills it with `fill`, and flushes.
fn write_file<F>(path: &Path, fill: F) -> CoreResult<u64>
where
    F: FnOnce(&mut FileBackend) -> CoreResult<u64>,
{
    let mut sink = FileBackend::create(path)?;
    let result = fill(&mut sink).and_then(|written| {
        sink.flush()?;
        Ok(written)
    });
    if result.is_err() {
        drop(sink);
        let _ = fs::remove_file(path);
    }
    result
}
