//! Extraction configuration.

use std::path::{Path, PathBuf};

/// Suffix appended to an archive's file name to form its default output
/// directory.
pub const OUTPUT_SUFFIX: &str = "_unpacked";

/// What to do when one entry cannot be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first failing entry.
    #[default]
    Abort,
    /// Record the failure and continue with the next entry.
    Skip,
}

/// Configuration for [`Unpacker`](crate::Unpacker).
#[derive(Debug, Clone)]
pub struct UnpackConfig {
    /// Directory entries are extracted under.
    pub output_dir: PathBuf,

    /// Failure handling per entry.
    pub error_policy: ErrorPolicy,

    /// Whether decompressed entries must match their `ExtractSize`.
    pub verify_extract_size: bool,

    /// Whether existing files may be replaced.
    pub overwrite: bool,
}

impl Default for UnpackConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(format!("cpk{OUTPUT_SUFFIX}")),
            error_policy: ErrorPolicy::Abort,
            verify_extract_size: true,
            overwrite: true,
        }
    }
}

impl UnpackConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration extracting to `<archive file name>_unpacked`
    /// in the current directory.
    #[must_use]
    pub fn for_archive(archive: &Path) -> Self {
        Self::new().output_dir(default_output_dir(archive))
    }

    /// Sets the output directory.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the per-entry failure policy.
    #[must_use]
    pub const fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Sets whether decompressed sizes are checked against `ExtractSize`.
    #[must_use]
    pub const fn verify_extract_size(mut self, value: bool) -> Self {
        self.verify_extract_size = value;
        self
    }

    /// Sets whether existing files may be replaced.
    #[must_use]
    pub const fn overwrite(mut self, value: bool) -> Self {
        self.overwrite = value;
        self
    }
}

/// `<archive file name>_unpacked`, relative to the current directory.
#[must_use]
pub fn default_output_dir(archive: &Path) -> PathBuf {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cpk".to_owned());
    PathBuf::from(format!("{name}{OUTPUT_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = UnpackConfig::default();
        assert_eq!(config.error_policy, ErrorPolicy::Abort);
        assert!(config.verify_extract_size);
        assert!(config.overwrite);
    }

    #[test]
    fn builder_pattern() {
        let config = UnpackConfig::new()
            .output_dir("out")
            .error_policy(ErrorPolicy::Skip)
            .verify_extract_size(false)
            .overwrite(false);

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.error_policy, ErrorPolicy::Skip);
        assert!(!config.verify_extract_size);
        assert!(!config.overwrite);
    }

    #[test]
    fn output_dir_follows_archive_name() {
        let config = UnpackConfig::for_archive(Path::new("/data/game/movie.cpk"));
        assert_eq!(config.output_dir, PathBuf::from("movie.cpk_unpacked"));
    }
}
