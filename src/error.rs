//! Error types for docmerger

use crate::domain::format::OutputFormat;
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything that can stop a merge attempt.
///
/// The `Display` output is what the status line shows to the user.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Select directory first!")]
    NoDirectorySelected,

    #[error("Enter output filename!")]
    NoOutputName,

    #[error("Select at least one file!")]
    NoFileSelected,

    /// The user refused to overwrite an existing output. Not a failure, the merge
    /// simply did not happen.
    #[error("Merge cancelled: '{}' was not overwritten", .0.display())]
    OverwriteDeclined(PathBuf),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not convert {}: {reason}", path.display())]
    Conversion { path: PathBuf, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl MergeError {
    pub(crate) fn conversion(path: &Path, reason: impl Display) -> Self {
        MergeError::Conversion {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        MergeError::Io {
            context: context.into(),
            source,
        }
    }

    /// Wraps a writer error whose concrete type belongs to a codec crate.
    pub(crate) fn write_failed(path: &Path, cause: impl Display) -> Self {
        MergeError::Io {
            context: format!("Failed to write {}", path.display()),
            source: io::Error::other(cause.to_string()),
        }
    }

    /// True for the user-cancelled outcome, which callers report as a notice
    /// rather than an error.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, MergeError::OverwriteDeclined(_))
    }
}

#[derive(Debug, Error)]
pub enum DocMergerError {
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Result directory does not exist yet. Merge some files first! ({})", .0.display())]
    NoResultDirectory(PathBuf),

    #[error("File is not listed under the current filter: {0}")]
    FileNotListed(String),

    #[error("File is listed more than once: {0}")]
    DuplicateFile(String),

    #[error("{} output is not available for the current selection", .0.label())]
    FormatUnavailable(OutputFormat),
}

pub type Result<T> = std::result::Result<T, DocMergerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_messages() {
        assert_eq!(
            MergeError::NoDirectorySelected.to_string(),
            "Select directory first!"
        );
        assert_eq!(MergeError::NoOutputName.to_string(), "Enter output filename!");
        assert_eq!(
            MergeError::NoFileSelected.to_string(),
            "Select at least one file!"
        );
    }

    #[test]
    fn test_conversion_message_names_file() {
        let err = MergeError::conversion(Path::new("/tmp/broken.png"), "bad header");
        let msg = err.to_string();
        assert!(msg.contains("broken.png"));
        assert!(msg.contains("bad header"));
    }

    #[test]
    fn test_cancellation_flag() {
        assert!(MergeError::OverwriteDeclined(PathBuf::from("out.pdf")).is_cancellation());
        assert!(!MergeError::NoFileSelected.is_cancellation());
    }

    #[test]
    fn test_merge_error_converts_to_crate_error() {
        let err: DocMergerError = MergeError::NoOutputName.into();
        assert_eq!(err.to_string(), "Enter output filename!");
    }
}
