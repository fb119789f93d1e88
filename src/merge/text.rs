//! Plain-text concatenation.

use super::{unsupported_input, write_atomically, MergeOutcome};
use crate::domain::format::OutputFormat;
use crate::domain::FileKind;
use crate::error::MergeError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Inserted between two consecutive files: a blank line, fifty `=`, a blank line.
pub const SEPARATOR: &str = "\n\n==================================================\n\n";

/// Joins the raw bytes of every input with [`SEPARATOR`]. Contents are not
/// decoded, so any encoding passes through unchanged.
pub fn concatenate(inputs: &[PathBuf]) -> Result<Vec<u8>, MergeError> {
    let mut combined = Vec::new();

    for (i, input) in inputs.iter().enumerate() {
        if FileKind::from_path(input) != FileKind::Text {
            return Err(unsupported_input(input, OutputFormat::Txt));
        }
        let content = fs::read(input).map_err(|e| MergeError::conversion(input, e))?;
        if i > 0 {
            combined.extend_from_slice(SEPARATOR.as_bytes());
        }
        combined.extend_from_slice(&content);
    }

    Ok(combined)
}

pub fn merge(inputs: &[PathBuf], output: &Path) -> Result<MergeOutcome, MergeError> {
    let combined = concatenate(inputs)?;

    write_atomically(output, |file| {
        file.write_all(&combined)
            .map_err(|e| MergeError::write_failed(output, e))
    })?;

    Ok(MergeOutcome::Written {
        path: output.to_path_buf(),
        inputs: inputs.len(),
        pages: None,
    })
}
