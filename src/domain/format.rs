//! Output formats and the rules deciding which ones a selection can produce.

use crate::error::MergeError;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Extensions decoded as raster images.
pub const IMAGE_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    /// Combined PDF, the universal fallback
    #[default]
    Pdf,
    /// Concatenated plain text
    Txt,
    /// Vertically stacked image
    Png,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Pdf, OutputFormat::Txt, OutputFormat::Png];

    /// Canonical extension appended to the output name, with leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => ".pdf",
            OutputFormat::Txt => ".txt",
            OutputFormat::Png => ".png",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "PDF",
            OutputFormat::Txt => "TXT",
            OutputFormat::Png => "PNG",
        }
    }

    /// Whether this format can be produced from the given set of distinct
    /// extensions. An empty set is never eligible.
    pub fn is_eligible_for(self, extensions: &BTreeSet<String>) -> bool {
        if extensions.is_empty() {
            return false;
        }
        match self {
            OutputFormat::Pdf => true,
            OutputFormat::Txt => extensions.len() == 1 && extensions.contains(".txt"),
            OutputFormat::Png => extensions.iter().all(|ext| is_image_extension(ext)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputFormat {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_lowercase();
        match normalized.as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "txt" => Ok(OutputFormat::Txt),
            "png" => Ok(OutputFormat::Png),
            _ => Err(MergeError::UnsupportedFormat(s.to_string())),
        }
    }
}

pub fn is_image_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension)
}

/// Computes the eligible output formats, in menu order, for the distinct
/// extensions of the selected entries.
pub fn eligible_formats(extensions: &BTreeSet<String>) -> Vec<OutputFormat> {
    OutputFormat::ALL
        .into_iter()
        .filter(|format| format.is_eligible_for(extensions))
        .collect()
}

/// Keeps `current` when still eligible, otherwise falls back to PDF.
pub fn reconcile_choice(current: OutputFormat, eligible: &[OutputFormat]) -> OutputFormat {
    if eligible.contains(&current) {
        current
    } else {
        OutputFormat::Pdf
    }
}
