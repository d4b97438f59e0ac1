//! TOC entries.

use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::path::PathBuf;

/// One file listed in the archive's TOC table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpkTocEntry {
    /// TOC row index.
    pub index: u32,
    /// `DirName` column; empty for the archive root.
    pub dir_name: String,
    /// `FileName` column.
    pub file_name: String,
    /// Bytes stored in the archive.
    pub file_size: u32,
    /// Bytes after extraction.
    pub extract_size: u32,
    /// Absolute offset of the stored bytes, already base-adjusted.
    pub file_offset: u64,
}

impl CpkTocEntry {
    /// Whether the stored bytes are a CRILAYLA container.
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.extract_size > self.file_size
    }

    /// `DirName/FileName` as recorded in the archive.
    #[must_use]
    pub fn archive_path(&self) -> String {
        if self.dir_name.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}/{}", self.dir_name, self.file_name)
        }
    }

    /// The entry's path relative to an output directory.
    ///
    /// Directory separators in either column are `/`. Empty and `.`
    /// components are dropped.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::InvalidPath`] for absolute paths, `..`
    /// components, backslashes or drive prefixes, and paths with no file
    /// name.
    pub fn relative_path(&self) -> CoreResult<PathBuf> {
        let recorded = self.archive_path();
        if recorded.starts_with('/') {
            return Err(CoreError::invalid_path(recorded, "absolute path"));
        }
        if recorded.contains('\\') || recorded.contains(':') {
            return Err(CoreError::invalid_path(recorded, "path is not portable"));
        }
        if matches!(recorded.rsplit('/').next(), None | Some("" | ".")) {
            return Err(CoreError::invalid_path(recorded, "missing file name"));
        }

        let mut path = PathBuf::new();
        for component in recorded.split('/') {
            match component {
                "" | "." => {}
                ".." => return Err(CoreError::invalid_path(recorded, "parent directory component")),
                name => path.push(name),
            }
        }
        if path.as_os_str().is_empty() {
            return Err(CoreError::invalid_path(recorded, "missing file name"));
        }
        Ok(path)
    }
}
